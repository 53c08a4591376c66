//! # Topics and payload schemas.
//!
//! A [`Topic`] names a class of messages. Identity is the `(origin, name)`
//! pair, so two modules that both declare a `"changed"` topic never deliver
//! to each other's listeners. The [`topic!`](crate::topic) macro fills the
//! origin with the calling module path.
//!
//! A topic may carry a [`Schema`]; envelopes built with
//! [`EnvelopeBuilder::build_checked`](crate::EnvelopeBuilder::build_checked)
//! are validated against it.
//!
//! ```rust
//! use topicbus::{topic, FieldKind, Payload, Schema};
//!
//! let moved = topic!("moved")
//!     .unwrap()
//!     .with_schema(Schema::new().field("x", FieldKind::Int));
//!
//! assert!(moved.validate(Some(&Payload::record([("x", 5.into())]))).is_ok());
//! assert!(moved.validate(Some(&Payload::record([("x", "abc".into())]))).is_err());
//! ```

mod schema;
mod topic;

pub use schema::{Field, FieldKind, Schema};
pub use topic::Topic;
