//! JSON-RPC protocol message types.
//!
//! This module defines the wire format spoken with the node bridge:
//! JSON-RPC 2.0 request/response objects carried as WebSocket text frames.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Server | Method call with correlation id |
//! | `Response` | Server → Client | Result or fault for a request id |
//! | `Notification` | Server → Client | Push message without an id |
//!
//! Responses are matched to in-flight requests by integer id; frames
//! without an id never fulfill a pending request.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Request/Response envelopes and fault mapping |
//! | `frame` | Inbound frame classification |
//! | `point` | Chain points, tips, and blocks |
//! | `chainsync` | `findIntersection` / `nextBlock` wire shapes |

// ============================================================================
// Submodules
// ============================================================================

/// Request/Response envelopes and fault mapping.
pub mod request;

/// Inbound frame classification.
pub mod frame;

/// Chain points, tips, and blocks.
pub mod point;

/// Chain-sync wire shapes.
pub mod chainsync;

// ============================================================================
// Re-exports
// ============================================================================

pub use chainsync::{FindIntersectionParams, FindIntersectionResult, NextBlockResult};
pub use frame::{Frame, decode_frame};
pub use point::{Block, Point, Tip};
pub use request::{Request, Response, RpcFault};
