//! Wire formats shared by the store snapshot and the plan document.
//!
//! Clock times travel as `HH:MM`, dates as `YYYY-MM-DD` (chrono's default
//! for `NaiveDate`). Identifiers are strings, but numeric identifiers are
//! accepted on input since upstream stores commonly key rows by integer.

use chrono::{NaiveTime, Timelike};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serializer};

use crate::error::{Result, ScheduleError};

/// Parses an `HH:MM` clock time.
///
/// `HH:MM:SS` is accepted only with zero seconds.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
        .filter(is_whole_minute)
        .ok_or_else(|| ScheduleError::InvalidTime(s.to_string()))
}

/// Whether a clock time carries no seconds or sub-second part.
pub fn is_whole_minute(t: &NaiveTime) -> bool {
    t.second() == 0 && t.nanosecond() == 0
}

/// Formats a clock time as `HH:MM`.
pub fn format_hhmm(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Serde adapter for `HH:MM` clock times.
pub mod hhmm {
    use super::*;

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&format_hhmm(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_hhmm(&raw).map_err(de::Error::custom)
    }

    /// Same as the parent module, for optional fields (`null` = absent).
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            t: &Option<NaiveTime>,
            s: S,
        ) -> std::result::Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_some(&format_hhmm(t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> std::result::Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => parse_hhmm(s).map(Some).map_err(de::Error::custom),
            }
        }
    }
}

/// Serde adapter for identifiers that may arrive as strings or integers.
pub mod id {
    use super::*;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a string or integer identifier")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        d.deserialize_any(IdVisitor)
    }

    pub mod option {
        use super::*;

        struct OptIdVisitor;

        impl<'de> Visitor<'de> for OptIdVisitor {
            type Value = Option<String>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("an optional string or integer identifier")
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(
                self,
                d: D,
            ) -> std::result::Result<Self::Value, D::Error> {
                super::deserialize(d).map(Some)
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> std::result::Result<Option<String>, D::Error> {
            d.deserialize_option(OptIdVisitor)
        }
    }
}
