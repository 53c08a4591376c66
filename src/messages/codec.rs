//! Serde field helpers for values JSON cannot carry as is.
//!
//! - floats: finite values are plain numbers; `NaN`, `inf` and `-inf` are
//!   written as those strings;
//! - timestamps: `{ "secs": i64, "nanos": u32 }` relative to the Unix epoch,
//!   `secs` negative for instants before it (`nanos` always counts forward).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

const NANOS_PER_SEC: u32 = 1_000_000_000;

#[derive(Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f64),
    Special(String),
}

fn encode_special<S: Serializer>(v: f64, s: S) -> Result<S::Ok, S::Error> {
    if v.is_nan() {
        s.serialize_str("NaN")
    } else if v.is_sign_positive() {
        s.serialize_str("inf")
    } else {
        s.serialize_str("-inf")
    }
}

fn decode<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match FloatRepr::deserialize(d)? {
        FloatRepr::Number(v) => Ok(v),
        FloatRepr::Special(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Str(other),
                &"a number, \"NaN\", \"inf\" or \"-inf\"",
            )),
        },
    }
}

/// `#[serde(with = "codec::double")]` for `f64` fields.
pub(crate) mod double {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_f64(*v)
        } else {
            encode_special(*v, s)
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        decode(d)
    }
}

/// `#[serde(with = "codec::float")]` for `f32` fields.
pub(crate) mod float {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(v: &f32, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_f32(*v)
        } else {
            encode_special(f64::from(*v), s)
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
        // the shortest f32 text parsed as f64 narrows back to the same f32
        decode(d).map(|v| v as f32)
    }
}

#[derive(Serialize, Deserialize)]
struct Stamp {
    secs: i64,
    nanos: u32,
}

impl Stamp {
    fn from_time(at: SystemTime) -> Option<Self> {
        match at.duration_since(UNIX_EPOCH) {
            Ok(after) => Some(Self {
                secs: i64::try_from(after.as_secs()).ok()?,
                nanos: after.subsec_nanos(),
            }),
            Err(err) => {
                let before = err.duration();
                let secs = i64::try_from(before.as_secs()).ok()?;
                Some(match before.subsec_nanos() {
                    0 => Self { secs: -secs, nanos: 0 },
                    n => Self {
                        secs: -secs - 1,
                        nanos: NANOS_PER_SEC - n,
                    },
                })
            }
        }
    }

    fn to_time(&self) -> Option<SystemTime> {
        if self.nanos >= NANOS_PER_SEC {
            return None;
        }
        let nanos = Duration::from_nanos(u64::from(self.nanos));
        if self.secs >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(self.secs.unsigned_abs()) + nanos)
        } else {
            UNIX_EPOCH
                .checked_sub(Duration::from_secs(self.secs.unsigned_abs()))?
                .checked_add(nanos)
        }
    }
}

/// `#[serde(with = "codec::timestamp")]` for `Option<SystemTime>` fields.
pub(crate) mod timestamp {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(v: &Option<SystemTime>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(at) => {
                let stamp = Stamp::from_time(*at)
                    .ok_or_else(|| <S::Error as ser::Error>::custom("timestamp out of range"))?;
                s.serialize_some(&stamp)
            }
            None => s.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SystemTime>, D::Error> {
        match Option::<Stamp>::deserialize(d)? {
            Some(stamp) => stamp
                .to_time()
                .map(Some)
                .ok_or_else(|| de::Error::custom("timestamp out of range")),
            None => Ok(None),
        }
    }
}
