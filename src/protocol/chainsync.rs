//! Chain-sync wire shapes.
//!
//! Parameter and result types for the two chain-sync methods:
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `findIntersection` | `{ points: [Point] }` | `{ intersection, tip }` |
//! | `nextBlock` | `{}` | `{ direction: "forward", block, tip }` or `{ direction: "backward", point, tip }` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::point::{Block, Point, Tip};

// ============================================================================
// findIntersection
// ============================================================================

/// Parameters for `findIntersection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindIntersectionParams {
    /// Candidate points, most recent first.
    pub points: Vec<Point>,
}

/// Result of a successful `findIntersection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindIntersectionResult {
    /// The point the server confirmed; becomes the session cursor.
    pub intersection: Point,

    /// Server tip at confirmation time.
    pub tip: Tip,
}

// ============================================================================
// nextBlock
// ============================================================================

/// Result of `nextBlock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum NextBlockResult {
    /// The chain extended; `block` is the direct successor of the cursor.
    Forward {
        /// The new block.
        block: Block,
        /// Server tip after this block.
        tip: Tip,
    },

    /// A previously reported block is no longer canonical.
    Backward {
        /// The point to rewind the cursor to.
        point: Point,
        /// Server tip after the rollback.
        tip: Tip,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_find_intersection_params_shape() {
        let params = FindIntersectionParams {
            points: vec![Point::block(500, "xyz"), Point::Origin],
        };
        let value = serde_json::to_value(&params).expect("serialize");

        assert_eq!(
            value,
            json!({ "points": [{ "slot": 500, "id": "xyz" }, "origin"] })
        );
    }

    #[test]
    fn test_find_intersection_result() {
        let result: FindIntersectionResult = serde_json::from_value(json!({
            "intersection": { "slot": 500, "id": "xyz" },
            "tip": { "slot": 1000, "id": "abc", "height": 100 }
        }))
        .expect("parse");

        assert_eq!(result.intersection, Point::block(500, "xyz"));
    }

    #[test]
    fn test_next_block_forward() {
        let result: NextBlockResult = serde_json::from_value(json!({
            "direction": "forward",
            "block": { "id": "bb", "slot": 501, "height": 51 },
            "tip": { "slot": 1000, "id": "abc", "height": 100 }
        }))
        .expect("parse");

        match result {
            NextBlockResult::Forward { block, .. } => {
                assert_eq!(block.point(), Point::block(501, "bb"));
            }
            NextBlockResult::Backward { .. } => panic!("expected forward"),
        }
    }

    #[test]
    fn test_next_block_backward() {
        let result: NextBlockResult = serde_json::from_value(json!({
            "direction": "backward",
            "point": { "slot": 400, "id": "aa" },
            "tip": { "slot": 1000, "id": "abc", "height": 100 }
        }))
        .expect("parse");

        match result {
            NextBlockResult::Backward { point, .. } => {
                assert_eq!(point, Point::block(400, "aa"));
            }
            NextBlockResult::Forward { .. } => panic!("expected backward"),
        }
    }

    #[test]
    fn test_next_block_backward_to_origin() {
        let result: NextBlockResult = serde_json::from_value(json!({
            "direction": "backward",
            "point": "origin",
            "tip": "origin"
        }))
        .expect("parse");

        assert!(matches!(
            result,
            NextBlockResult::Backward {
                point: Point::Origin,
                ..
            }
        ));
    }
}
