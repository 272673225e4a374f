//! WebSocket transport layer.
//!
//! This module owns the connection to the node bridge and the
//! request/response correlation over it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)   │          WebSocket           │  Node bridge    │
//! │                  │◄────────────────────────────►│  (Ogmios)       │
//! │  Connection      │       ws://host:port         │                 │
//! │  + Correlation   │                              │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Dial the endpoint, spawn the event loop
//! 2. `Connection::call` - Send requests, await correlated responses
//! 3. Disconnect - Every in-flight request fails with `ConnectionClosed`
//! 4. The facade builds a fresh `Connection` on reconnect; identifier
//!    spaces never span connections
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket event loop and send path |
//! | `correlation` | Request identifier allocation and in-flight table |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Request identifier allocation and in-flight tracking.
pub mod correlation;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ClientEvent, Connection, ConnectionState, DisconnectReason, EventHandler};
pub use correlation::CorrelationTable;
