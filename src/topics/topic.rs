use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaViolation, TopicError};
use crate::messages::Payload;

use super::Schema;

/// Creates a [`Topic`] whose origin is the calling module.
///
/// Expands to `Topic::new(module_path!(), name)` and therefore returns a
/// `Result<Topic, TopicError>`.
///
/// ```rust
/// let a = topicbus::topic!("changed").unwrap();
/// let b = topicbus::Topic::new("other::module", "changed").unwrap();
/// assert_ne!(a, b);
/// ```
#[macro_export]
macro_rules! topic {
    ($name:expr) => {
        $crate::Topic::new(::core::module_path!(), $name)
    };
}

struct TopicInner {
    origin: String,
    name: String,
    schema: Option<Schema>,
}

/// Identity token for a class of messages.
///
/// Cheap to clone (`Arc` inside). Equality and hashing use `(origin, name)`
/// only; the schema does not take part in identity.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "TopicRepr", into = "TopicRepr")]
pub struct Topic {
    inner: Arc<TopicInner>,
}

impl Topic {
    /// Creates a topic without a schema.
    ///
    /// Fails with [`TopicError::InvalidName`] for an empty or blank name and
    /// with [`TopicError::InvalidOrigin`] for an empty origin.
    pub fn new(origin: impl Into<String>, name: impl Into<String>) -> Result<Self, TopicError> {
        let origin = origin.into();
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TopicError::InvalidName { name });
        }
        if origin.is_empty() {
            return Err(TopicError::InvalidOrigin { name });
        }
        Ok(Self {
            inner: Arc::new(TopicInner {
                origin,
                name,
                schema: None,
            }),
        })
    }

    /// Returns the same topic carrying `schema`.
    #[must_use]
    pub fn with_schema(self, schema: Schema) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.schema = Some(schema);
                inner
            }
            Err(shared) => TopicInner {
                origin: shared.origin.clone(),
                name: shared.name.clone(),
                schema: Some(schema),
            },
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Defining origin (usually a module path).
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Payload schema, if any.
    pub fn schema(&self) -> Option<&Schema> {
        self.inner.schema.as_ref()
    }

    /// Checks `payload` against this topic's schema.
    ///
    /// Always succeeds for topics without a schema. An absent payload only
    /// passes a schema that has no required fields.
    pub fn validate(&self, payload: Option<&Payload>) -> Result<(), SchemaViolation> {
        let Some(schema) = self.schema() else {
            return Ok(());
        };
        match payload {
            Some(value) => schema.validate(value),
            None if schema.has_required_fields() => Err(SchemaViolation::MissingPayload {
                topic: self.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.origin == other.inner.origin && self.inner.name == other.inner.name)
    }
}

impl Eq for Topic {}

impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.origin.hash(state);
        self.inner.name.hash(state);
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.inner.origin, self.inner.name)
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("origin", &self.inner.origin)
            .field("name", &self.inner.name)
            .field("schema", &self.inner.schema.is_some())
            .finish()
    }
}

/// Serialized form; deserialization goes back through [`Topic::new`].
#[derive(Serialize, Deserialize)]
struct TopicRepr {
    origin: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<Schema>,
}

impl From<Topic> for TopicRepr {
    fn from(topic: Topic) -> Self {
        Self {
            origin: topic.inner.origin.clone(),
            name: topic.inner.name.clone(),
            schema: topic.inner.schema.clone(),
        }
    }
}

impl TryFrom<TopicRepr> for Topic {
    type Error = TopicError;

    fn try_from(repr: TopicRepr) -> Result<Self, Self::Error> {
        let topic = Topic::new(repr.origin, repr.name)?;
        Ok(match repr.schema {
            Some(schema) => topic.with_schema(schema),
            None => topic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::FieldKind;
    use std::collections::HashSet;

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(
            Topic::new("app", "").unwrap_err(),
            TopicError::InvalidName { name: String::new() }
        );
        assert!(matches!(
            Topic::new("app", " \t"),
            Err(TopicError::InvalidName { .. })
        ));
        assert!(matches!(
            Topic::new("", "changed"),
            Err(TopicError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_same_name_different_origin_not_equal() {
        let a = Topic::new("lists", "changed").unwrap();
        let b = Topic::new("maps", "changed").unwrap();
        assert_ne!(a, b);

        let set: HashSet<Topic> = [a.clone(), b, a.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_identity_ignores_schema() {
        let plain = Topic::new("app", "moved").unwrap();
        let typed = Topic::new("app", "moved")
            .unwrap()
            .with_schema(Schema::new().field("x", FieldKind::Int));
        assert_eq!(plain, typed);
        assert!(plain.schema().is_none());
        assert!(typed.schema().is_some());
    }

    #[test]
    fn test_macro_uses_module_path() {
        let t = topic!("local").unwrap();
        assert_eq!(t.origin(), module_path!());
        assert_eq!(t.name(), "local");
    }

    #[test]
    fn test_with_schema_on_shared_topic_keeps_original() {
        let original = Topic::new("app", "moved").unwrap();
        let shared = original.clone();
        let typed = shared.with_schema(Schema::new().field("x", FieldKind::Int));
        assert!(original.schema().is_none());
        assert!(typed.schema().is_some());
    }

    #[test]
    fn test_absent_payload_against_schema() {
        let required = Topic::new("app", "a")
            .unwrap()
            .with_schema(Schema::new().field("x", FieldKind::Int));
        assert!(matches!(
            required.validate(None),
            Err(SchemaViolation::MissingPayload { .. })
        ));

        let optional = Topic::new("app", "b")
            .unwrap()
            .with_schema(Schema::new().optional("x", FieldKind::Int));
        assert!(optional.validate(None).is_ok());

        let untyped = Topic::new("app", "c").unwrap();
        assert!(untyped.validate(None).is_ok());
    }

    #[test]
    fn test_serde_roundtrip_rejects_blank_name() {
        let t = Topic::new("app", "moved")
            .unwrap()
            .with_schema(Schema::new().field("x", FieldKind::Int));
        let json = serde_json::to_string(&t).unwrap();
        let back: Topic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.schema(), t.schema());

        let bad = r#"{"origin":"app","name":""}"#;
        assert!(serde_json::from_str::<Topic>(bad).is_err());
    }
}
