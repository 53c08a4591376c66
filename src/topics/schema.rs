use serde::{Deserialize, Serialize};

use crate::error::SchemaViolation;
use crate::messages::Payload;

/// Shape a field value must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Byte,
    Char,
    Bool,
    Short,
    Int,
    Long,
    Float,
    Double,
    Text,
    /// Any list; elements are not checked.
    List,
    /// A nested record checked against its own schema.
    Record(Schema),
    /// Accepts every value.
    Any,
}

impl FieldKind {
    /// Short name, matching [`Payload::kind`].
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Byte => "byte",
            FieldKind::Char => "char",
            FieldKind::Bool => "bool",
            FieldKind::Short => "short",
            FieldKind::Int => "int",
            FieldKind::Long => "long",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Text => "text",
            FieldKind::List => "list",
            FieldKind::Record(_) => "record",
            FieldKind::Any => "any",
        }
    }

    fn check(&self, value: &Payload, path: &str) -> Result<(), SchemaViolation> {
        match self {
            FieldKind::Any => Ok(()),
            FieldKind::Record(schema) => schema.check(value, path),
            kind if kind.as_str() == value.kind() => Ok(()),
            kind => Err(SchemaViolation::WrongType {
                path: path.to_string(),
                expected: kind.as_str(),
                found: value.kind(),
            }),
        }
    }
}

/// One declared field of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Record-shaped payload description.
///
/// Fields not declared here are rejected unless [`Schema::allow_extra`] was
/// called.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
    #[serde(default)]
    allow_extra: bool,
}

impl Schema {
    /// Empty schema: accepts only an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.push(name.into(), kind, true);
        self
    }

    /// Declares an optional field.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.push(name.into(), kind, false);
        self
    }

    /// Accepts fields the schema does not declare.
    #[must_use]
    pub fn allow_extra(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Checks a payload against this schema.
    pub fn validate(&self, payload: &Payload) -> Result<(), SchemaViolation> {
        self.check(payload, "")
    }

    pub(crate) fn has_required_fields(&self) -> bool {
        self.fields.iter().any(|f| f.required)
    }

    // Redeclaring a name replaces the earlier declaration.
    fn push(&mut self, name: String, kind: FieldKind, required: bool) {
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field {
            name,
            kind,
            required,
        });
    }

    fn check(&self, value: &Payload, path: &str) -> Result<(), SchemaViolation> {
        let Payload::Record(record) = value else {
            return Err(SchemaViolation::NotARecord {
                path: path.to_string(),
                found: value.kind(),
            });
        };

        for field in &self.fields {
            let field_path = join(path, &field.name);
            match record.get(&field.name) {
                Some(v) => field.kind.check(v, &field_path)?,
                None if field.required => {
                    return Err(SchemaViolation::MissingField { path: field_path })
                }
                None => {}
            }
        }

        if !self.allow_extra {
            if let Some(extra) = record
                .keys()
                .find(|key| !self.fields.iter().any(|f| &f.name == *key))
            {
                return Err(SchemaViolation::UnexpectedField {
                    path: join(path, extra),
                });
            }
        }
        Ok(())
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Schema {
        Schema::new().field("x", FieldKind::Int).field("y", FieldKind::Int)
    }

    #[test]
    fn test_int_field_accepts_int_rejects_text() {
        let schema = Schema::new().field("x", FieldKind::Int);
        assert!(schema.validate(&Payload::record([("x", 5.into())])).is_ok());
        assert_eq!(
            schema.validate(&Payload::record([("x", "abc".into())])),
            Err(SchemaViolation::WrongType {
                path: "x".into(),
                expected: "int",
                found: "text",
            })
        );
    }

    #[test]
    fn test_no_implicit_widening() {
        let schema = Schema::new().field("x", FieldKind::Long);
        assert!(schema.validate(&Payload::record([("x", 5_i32.into())])).is_err());
        assert!(schema.validate(&Payload::record([("x", 5_i64.into())])).is_ok());
    }

    #[test]
    fn test_missing_and_extra_fields() {
        let schema = point();
        assert_eq!(
            schema.validate(&Payload::record([("x", 1.into())])),
            Err(SchemaViolation::MissingField { path: "y".into() })
        );
        assert_eq!(
            schema.validate(&Payload::record([
                ("x", 1.into()),
                ("y", 2.into()),
                ("z", 3.into())
            ])),
            Err(SchemaViolation::UnexpectedField { path: "z".into() })
        );
        assert!(point()
            .allow_extra()
            .validate(&Payload::record([
                ("x", 1.into()),
                ("y", 2.into()),
                ("z", 3.into())
            ]))
            .is_ok());
    }

    #[test]
    fn test_optional_field_may_be_absent_but_not_mistyped() {
        let schema = Schema::new()
            .field("id", FieldKind::Long)
            .optional("label", FieldKind::Text);
        assert!(schema.validate(&Payload::record([("id", 7_i64.into())])).is_ok());
        assert!(schema
            .validate(&Payload::record([("id", 7_i64.into()), ("label", true.into())]))
            .is_err());
    }

    #[test]
    fn test_nested_record_reports_dotted_path() {
        let schema = Schema::new().field("from", FieldKind::Record(point()));
        let bad = Payload::record([(
            "from",
            Payload::record([("x", 1.into()), ("y", 2.5_f64.into())]),
        )]);
        assert_eq!(
            schema.validate(&bad),
            Err(SchemaViolation::WrongType {
                path: "from.y".into(),
                expected: "int",
                found: "double",
            })
        );
    }

    #[test]
    fn test_non_record_payload() {
        assert_eq!(
            point().validate(&Payload::Int(3)),
            Err(SchemaViolation::NotARecord {
                path: String::new(),
                found: "int",
            })
        );
    }

    #[test]
    fn test_any_and_list() {
        let schema = Schema::new()
            .field("meta", FieldKind::Any)
            .field("items", FieldKind::List);
        let ok = Payload::record([
            ("meta", 'c'.into()),
            ("items", Payload::List(vec![1.into(), "two".into()])),
        ]);
        assert!(schema.validate(&ok).is_ok());
    }

    #[test]
    fn test_redeclared_field_replaces_previous() {
        let schema = Schema::new()
            .field("x", FieldKind::Int)
            .optional("x", FieldKind::Text);
        assert_eq!(schema.fields().len(), 1);
        assert!(!schema.has_required_fields());
    }
}
