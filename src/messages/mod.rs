//! # Message envelopes and payload values.
//!
//! [`Envelope`] is the immutable unit of data a fire call delivers: topic,
//! producer identity, optional [`Payload`], optional timestamp. Envelopes are
//! built through [`EnvelopeBuilder`]; `build_checked` validates the payload
//! against the topic schema and fails instead of producing a half-valid value.

mod codec;
mod envelope;
mod payload;

pub use envelope::{Envelope, EnvelopeBuilder, ProducerId};
pub use payload::Payload;
