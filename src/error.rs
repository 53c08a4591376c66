//! Error types used by topics, envelopes, listeners and the remote adapter.
//!
//! This module defines the crate's error enums:
//!
//! - [`TopicError`]: a topic could not be constructed.
//! - [`SchemaViolation`]: a payload does not match its topic's schema.
//! - [`ListenerError`]: a listener failed to take a delivery.
//! - [`RemoteError`]: the remote adapter could not be set up.
//!
//! All of them provide `as_label` for logs. Duplicate subscriptions are **not**
//! errors: `subscribe` reports them with a plain `false`.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced when constructing a [`Topic`](crate::Topic).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// The topic name is empty or whitespace only.
    #[error("invalid topic name {name:?}: must not be empty")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The topic origin is empty.
    #[error("invalid topic origin for {name:?}: must not be empty")]
    InvalidOrigin {
        /// Name of the topic whose origin was rejected.
        name: String,
    },
}

impl TopicError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use topicbus::Topic;
    ///
    /// let err = Topic::new("app", "  ").unwrap_err();
    /// assert_eq!(err.as_label(), "topic_invalid_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TopicError::InvalidName { .. } => "topic_invalid_name",
            TopicError::InvalidOrigin { .. } => "topic_invalid_origin",
        }
    }
}

/// # A payload that does not match its topic's schema.
///
/// `path` is the dotted path of the offending field (`""` for the payload root).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// The schema declares fields but the envelope carries no payload.
    #[error("payload missing for topic {topic}")]
    MissingPayload {
        /// Topic the envelope was built for.
        topic: String,
    },

    /// The payload (or a nested value) is not a record.
    #[error("{path:?}: expected a record, found {found}")]
    NotARecord {
        /// Path of the value.
        path: String,
        /// Kind of the value that was found.
        found: &'static str,
    },

    /// A required field is absent.
    #[error("{path:?}: required field missing")]
    MissingField {
        /// Path of the missing field.
        path: String,
    },

    /// A field holds a value of the wrong kind.
    #[error("{path:?}: expected {expected}, found {found}")]
    WrongType {
        /// Path of the field.
        path: String,
        /// Kind declared by the schema.
        expected: &'static str,
        /// Kind of the value that was found.
        found: &'static str,
    },

    /// The payload carries a field the schema does not declare.
    #[error("{path:?}: field not declared by schema")]
    UnexpectedField {
        /// Path of the extra field.
        path: String,
    },
}

impl SchemaViolation {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SchemaViolation::MissingPayload { .. } => "schema_missing_payload",
            SchemaViolation::NotARecord { .. } => "schema_not_a_record",
            SchemaViolation::MissingField { .. } => "schema_missing_field",
            SchemaViolation::WrongType { .. } => "schema_wrong_type",
            SchemaViolation::UnexpectedField { .. } => "schema_unexpected_field",
        }
    }
}

/// # Delivery failure raised by a listener.
///
/// Whatever the variant, the dispatcher reacts the same way: the listener is
/// unsubscribed and delivery continues with the next one. The variants only
/// matter for logs.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The listener refused or failed to process the envelope.
    #[error("listener rejected envelope: {reason}")]
    Rejected {
        /// Human-readable reason.
        reason: String,
    },

    /// The transport behind a remote listener failed.
    #[error("transport failure: {reason}")]
    Transport {
        /// Underlying I/O or codec error.
        reason: String,
    },

    /// The listener did not finish within the configured timeout.
    #[error("listener timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The listener panicked during `notify`.
    #[error("listener panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl ListenerError {
    /// Shorthand for [`ListenerError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        ListenerError::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use topicbus::ListenerError;
    ///
    /// assert_eq!(ListenerError::rejected("nope").as_label(), "listener_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Rejected { .. } => "listener_rejected",
            ListenerError::Transport { .. } => "listener_transport",
            ListenerError::Timeout { .. } => "listener_timeout",
            ListenerError::Panicked { .. } => "listener_panicked",
        }
    }
}

/// # Errors produced while setting up the remote adapter.
///
/// Unlike delivery failures these are surfaced to the caller: there is no
/// subscription yet that could be dropped instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The endpoint could not bind its socket.
    #[error("cannot bind remote endpoint on {addr}: {source}")]
    Bind {
        /// Address the endpoint tried to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The adapter could not reach the remote endpoint.
    #[error("cannot connect to remote endpoint {addr}: {source}")]
    Connect {
        /// Address of the remote endpoint.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Connecting took longer than the configured timeout.
    #[error("connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Address of the remote endpoint.
        addr: SocketAddr,
        /// The timeout that was exceeded.
        timeout: Duration,
    },
}

impl RemoteError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RemoteError::Bind { .. } => "remote_bind",
            RemoteError::Connect { .. } => "remote_connect",
            RemoteError::ConnectTimeout { .. } => "remote_connect_timeout",
        }
    }
}
