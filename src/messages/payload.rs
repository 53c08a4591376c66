use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::codec;

/// Value carried by an [`Envelope`](crate::Envelope).
///
/// Primitive variants mirror the typed `fire` overloads; `Record` is the
/// structured form checked by a topic [`Schema`](crate::Schema). Non-finite
/// floats survive serialization as `"NaN"`, `"inf"` and `"-inf"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Byte(i8),
    Char(char),
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(#[serde(with = "codec::float")] f32),
    Double(#[serde(with = "codec::double")] f64),
    Text(String),
    List(Vec<Payload>),
    Record(BTreeMap<String, Payload>),
}

impl Payload {
    /// Builds a `Record` from `(field, value)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Payload)>,
    {
        Payload::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short kind name (`"int"`, `"text"`, `"record"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Byte(_) => "byte",
            Payload::Char(_) => "char",
            Payload::Bool(_) => "bool",
            Payload::Short(_) => "short",
            Payload::Int(_) => "int",
            Payload::Long(_) => "long",
            Payload::Float(_) => "float",
            Payload::Double(_) => "double",
            Payload::Text(_) => "text",
            Payload::List(_) => "list",
            Payload::Record(_) => "record",
        }
    }

    /// Field of a `Record`; `None` for other variants.
    pub fn get(&self, field: &str) -> Option<&Payload> {
        match self {
            Payload::Record(map) => map.get(field),
            _ => None,
        }
    }

    /// Any integer variant widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Payload::Byte(v) => Some(i64::from(v)),
            Payload::Short(v) => Some(i64::from(v)),
            Payload::Int(v) => Some(i64::from(v)),
            Payload::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Either float variant widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Payload::Float(v) => Some(f64::from(v)),
            Payload::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

macro_rules! payload_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                #[inline]
                fn from(v: $ty) -> Self {
                    Payload::$variant(v)
                }
            }
        )*
    };
}

payload_from! {
    i8 => Byte,
    char => Char,
    bool => Bool,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<Payload> => List,
    BTreeMap<String, Payload> => Record,
}

impl From<&str> for Payload {
    #[inline]
    fn from(v: &str) -> Self {
        Payload::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions_pick_matching_variant() {
        assert_eq!(Payload::from(1_i8), Payload::Byte(1));
        assert_eq!(Payload::from(1_i16), Payload::Short(1));
        assert_eq!(Payload::from(1), Payload::Int(1));
        assert_eq!(Payload::from(1_i64), Payload::Long(1));
        assert_eq!(Payload::from(0.5_f32), Payload::Float(0.5));
        assert_eq!(Payload::from(0.5), Payload::Double(0.5));
        assert_eq!(Payload::from("hi"), Payload::Text("hi".into()));
        assert_eq!(Payload::from('x').kind(), "char");
    }

    #[test]
    fn test_record_accessors() {
        let p = Payload::record([("count", 3.into()), ("name", "a".into())]);
        assert_eq!(p.kind(), "record");
        assert_eq!(p.get("count").and_then(Payload::as_i64), Some(3));
        assert_eq!(p.get("name").and_then(Payload::as_text), Some("a"));
        assert!(p.get("missing").is_none());
        assert!(Payload::Int(1).get("count").is_none());
    }

    #[test]
    fn test_numeric_widening_helpers() {
        assert_eq!(Payload::Byte(-2).as_i64(), Some(-2));
        assert_eq!(Payload::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Payload::Text("1".into()).as_i64(), None);
    }

    #[test]
    fn test_non_finite_floats_survive_json() {
        let p = Payload::List(vec![
            Payload::Double(f64::NAN),
            Payload::Double(f64::NEG_INFINITY),
            Payload::Float(f32::INFINITY),
            Payload::Float(0.25),
        ]);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"NaN\""), "{json}");

        let Payload::List(back) = serde_json::from_str::<Payload>(&json).unwrap() else {
            panic!("not a list");
        };
        assert!(back[0].as_f64().is_some_and(f64::is_nan));
        assert_eq!(back[1], Payload::Double(f64::NEG_INFINITY));
        assert_eq!(back[2], Payload::Float(f32::INFINITY));
        assert_eq!(back[3], Payload::Float(0.25));
    }

    #[test]
    fn test_unknown_float_marker_is_rejected() {
        assert!(serde_json::from_str::<Payload>(r#"{"Double":"nan"}"#).is_err());
        assert!(serde_json::from_str::<Payload>(r#"{"Double":1.5}"#).is_ok());
    }
}
