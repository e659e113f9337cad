//! Identifiers for graph entities.
//!
//! Every [`Node`](crate::graph::Node) and [`Edge`](crate::graph::Edge) is
//! keyed by a [`Uid`]. Identifiers come from one of three schemes: a serial
//! number handed out by the owning [`Graph`](crate::graph::Graph), a random
//! UUID, or an opaque name that arrived from external data and could not be
//! read as either.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a graph entity.
///
/// # Examples
///
/// ```
/// use plotlines_core::identifier::{RawUid, Uid};
///
/// assert_eq!(RawUid::Int(7).resolve(), Uid::Serial(7));
/// assert_eq!(RawUid::from("12").resolve(), Uid::Serial(12));
/// assert_eq!(RawUid::from("start").resolve(), Uid::Name("start".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Uid {
    /// Allocated from the arena's monotonic counter.
    Serial(u64),
    /// Random version 4 UUID.
    Uuid(Uuid),
    /// Symbolic external reference kept verbatim.
    Name(String),
}

impl Uid {
    /// Converts back to the raw form used in structured records.
    pub fn to_raw(&self) -> RawUid {
        match self {
            Self::Serial(n) => RawUid::Int(*n as i64),
            Self::Uuid(uuid) => RawUid::Text(uuid.to_string()),
            Self::Name(name) => RawUid::Text(name.clone()),
        }
    }

    /// Returns true when this identifier is an opaque name.
    pub fn is_name(&self) -> bool {
        matches!(self, Self::Name(_))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial(n) => write!(f, "{n}"),
            Self::Uuid(uuid) => write!(f, "{uuid}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<u64> for Uid {
    fn from(value: u64) -> Self {
        Self::Serial(value)
    }
}

impl From<Uuid> for Uid {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl FromStr for Uid {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RawUid::from(s).resolve())
    }
}

impl Serialize for Uid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawUid::deserialize(deserializer).map(|raw| raw.resolve())
    }
}

/// An identifier as it appears in structured data, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawUid {
    Int(i64),
    Text(String),
}

impl RawUid {
    /// Resolves the raw value into a typed [`Uid`].
    ///
    /// Integers become serials, UUID text becomes a UUID and integer text a
    /// serial. Anything else falls back to the original text as an opaque
    /// name.
    pub fn resolve(&self) -> Uid {
        match self {
            Self::Int(n) if *n >= 0 => Uid::Serial(*n as u64),
            Self::Int(n) => Uid::Name(n.to_string()),
            Self::Text(text) => {
                let text = text.trim();
                if let Ok(uuid) = Uuid::parse_str(text) {
                    Uid::Uuid(uuid)
                } else if let Ok(n) = text.parse::<u64>() {
                    Uid::Serial(n)
                } else {
                    Uid::Name(text.to_string())
                }
            }
        }
    }
}

impl From<&str> for RawUid {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for RawUid {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Strategy used by a [`Graph`](crate::graph::Graph) when allocating new
/// identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// Small integers from a monotonic counter.
    #[default]
    Serial,
    /// Random version 4 UUIDs.
    Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_int() {
        assert_eq!(RawUid::Int(3).resolve(), Uid::Serial(3));
    }

    #[test]
    fn test_resolve_negative_int_is_name() {
        assert_eq!(RawUid::Int(-3).resolve(), Uid::Name("-3".to_string()));
    }

    #[test]
    fn test_resolve_uuid_text() {
        let uuid = Uuid::new_v4();
        assert_eq!(RawUid::Text(uuid.to_string()).resolve(), Uid::Uuid(uuid));
    }

    #[test]
    fn test_resolve_malformed_falls_back_to_name() {
        let raw = RawUid::from("ending_01");
        assert_eq!(raw.resolve(), Uid::Name("ending_01".to_string()));
    }

    #[test]
    fn test_raw_round_trip() {
        let uids = [
            Uid::Serial(42),
            Uid::Uuid(Uuid::new_v4()),
            Uid::Name("gate".to_string()),
        ];
        for uid in uids {
            assert_eq!(uid.to_raw().resolve(), uid);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Uid::Serial(5).to_string(), "5");
        assert_eq!(Uid::Name("x".to_string()).to_string(), "x");
    }
}
