//! Chain points, tips, and blocks.
//!
//! A point is a `(slot, block-hash)` pair both sides agree is on the
//! canonical chain, or the `"origin"` sentinel. On the wire a point is
//! either a JSON object or the literal string `"origin"`, so both `Point`
//! and `Tip` carry custom serde implementations.

// ============================================================================
// Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ============================================================================
// Point
// ============================================================================

/// A position on the chain.
///
/// # Format
///
/// ```json
/// { "slot": 500, "id": "abc..." }
/// ```
///
/// or the string `"origin"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Point {
    /// The very start of the chain.
    Origin,

    /// A specific block position.
    Block {
        /// Absolute slot number.
        slot: u64,
        /// Hex-encoded block header hash.
        id: String,
    },
}

impl Point {
    /// Creates a block point.
    #[inline]
    #[must_use]
    pub fn block(slot: u64, id: impl Into<String>) -> Self {
        Self::Block {
            slot,
            id: id.into(),
        }
    }

    /// Returns `true` if this is the origin sentinel.
    #[inline]
    #[must_use]
    pub fn is_origin(&self) -> bool {
        matches!(self, Self::Origin)
    }

    /// Returns the slot number, if any.
    #[inline]
    #[must_use]
    pub fn slot(&self) -> Option<u64> {
        match self {
            Self::Origin => None,
            Self::Block { slot, .. } => Some(*slot),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Block { slot, id } => write!(f, "{slot}@{id}"),
        }
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Block { slot: a, .. }, Self::Block { slot: b, .. }) => a.partial_cmp(b),
            (Self::Origin, Self::Origin) => Some(Ordering::Equal),
            (Self::Origin, Self::Block { .. }) => Some(Ordering::Less),
            (Self::Block { .. }, Self::Origin) => Some(Ordering::Greater),
        }
    }
}

impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Block { slot, id } => {
                #[derive(Serialize)]
                struct Wire<'a> {
                    slot: u64,
                    id: &'a str,
                }
                Wire { slot: *slot, id }.serialize(serializer)
            }
            Self::Origin => serializer.serialize_str("origin"),
        }
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            slot: u64,
            id: String,
        }

        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) if s == "origin" => Ok(Self::Origin),
            Value::Object(_) => {
                let wire: Wire =
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                Ok(Self::Block {
                    slot: wire.slot,
                    id: wire.id,
                })
            }
            _ => Err(serde::de::Error::custom(
                "expected \"origin\" or object with slot and id",
            )),
        }
    }
}

// ============================================================================
// Tip
// ============================================================================

/// The server's view of the chain tip.
///
/// Like [`Point`] but additionally carries the block height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tip {
    /// Empty chain.
    Origin,

    /// Current tip position.
    Point {
        /// Absolute slot number.
        slot: u64,
        /// Hex-encoded block header hash.
        id: String,
        /// Block height.
        height: u64,
    },
}

impl Tip {
    /// Returns the tip as a plain [`Point`].
    #[inline]
    #[must_use]
    pub fn to_point(&self) -> Point {
        match self {
            Self::Origin => Point::Origin,
            Self::Point { slot, id, .. } => Point::block(*slot, id.clone()),
        }
    }
}

impl PartialOrd for Tip {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Point { slot: a, .. }, Self::Point { slot: b, .. }) => a.partial_cmp(b),
            (Self::Origin, Self::Origin) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl Serialize for Tip {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Point { slot, id, height } => {
                #[derive(Serialize)]
                struct Wire<'a> {
                    slot: u64,
                    id: &'a str,
                    height: u64,
                }
                Wire {
                    slot: *slot,
                    id,
                    height: *height,
                }
                .serialize(serializer)
            }
            Self::Origin => serializer.serialize_str("origin"),
        }
    }
}

impl<'de> Deserialize<'de> for Tip {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            slot: u64,
            id: String,
            #[serde(default)]
            height: u64,
        }

        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) if s == "origin" => Ok(Self::Origin),
            Value::Object(_) => {
                let wire: Wire =
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                Ok(Self::Point {
                    slot: wire.slot,
                    id: wire.id,
                    height: wire.height,
                })
            }
            _ => Err(serde::de::Error::custom(
                "expected \"origin\" or object with slot, id and height",
            )),
        }
    }
}

// ============================================================================
// Block
// ============================================================================

/// A block delivered by `nextBlock`.
///
/// Only the fields needed to advance the cursor are typed; the rest of the
/// block body (era-specific transactions, certificates, ...) stays as raw
/// JSON for the caller to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Hex-encoded block header hash.
    pub id: String,

    /// Absolute slot number.
    pub slot: u64,

    /// Block height, when the era provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,

    /// Remaining block body, untouched.
    #[serde(flatten)]
    pub body: Value,
}

impl Block {
    /// Returns the block's chain point.
    #[inline]
    #[must_use]
    pub fn point(&self) -> Point {
        Point::block(self.slot, self.id.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_point_deserialize_object() {
        let point: Point =
            serde_json::from_value(json!({ "slot": 500, "id": "xyz" })).expect("parse");
        assert_eq!(point, Point::block(500, "xyz"));
        assert_eq!(point.slot(), Some(500));
    }

    #[test]
    fn test_point_deserialize_origin() {
        let point: Point = serde_json::from_value(json!("origin")).expect("parse");
        assert!(point.is_origin());
        assert_eq!(point.slot(), None);
    }

    #[test]
    fn test_point_serialize_round_trip() {
        let point = Point::block(1234, "abcd");
        let value = serde_json::to_value(&point).expect("serialize");
        assert_eq!(value, json!({ "slot": 1234, "id": "abcd" }));

        let back: Point = serde_json::from_value(value).expect("parse");
        assert_eq!(back, point);
    }

    #[test]
    fn test_point_rejects_other_strings() {
        let result: Result<Point, _> = serde_json::from_value(json!("tip"));
        assert!(result.is_err());
    }

    #[test]
    fn test_point_ordering() {
        let early = Point::block(10, "a");
        let late = Point::block(20, "b");

        assert!(early < late);
        assert!(Point::Origin < early);
    }

    #[test]
    fn test_tip_round_trip() {
        let tip: Tip = serde_json::from_value(json!({
            "slot": 1000,
            "id": "abc",
            "height": 99
        }))
        .expect("parse");

        assert_eq!(
            tip,
            Tip::Point {
                slot: 1000,
                id: "abc".into(),
                height: 99
            }
        );
        assert_eq!(tip.to_point(), Point::block(1000, "abc"));
    }

    #[test]
    fn test_tip_origin_not_comparable_to_point() {
        let origin = Tip::Origin;
        let point = Tip::Point {
            slot: 1,
            id: "a".into(),
            height: 1,
        };
        assert_eq!(origin.partial_cmp(&point), None);
    }

    #[test]
    fn test_block_keeps_body() {
        let block: Block = serde_json::from_value(json!({
            "id": "deadbeef",
            "slot": 77,
            "height": 7,
            "era": "conway",
            "transactions": []
        }))
        .expect("parse");

        assert_eq!(block.point(), Point::block(77, "deadbeef"));
        assert_eq!(block.body["era"], "conway");
        assert_eq!(block.body["transactions"], json!([]));
    }

    #[test]
    fn test_block_max_slot_preserved() {
        let block: Block = serde_json::from_value(json!({
            "id": "ff",
            "slot": u64::MAX
        }))
        .expect("parse");
        assert_eq!(block.slot, u64::MAX);
    }
}
