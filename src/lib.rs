//! Ogmios client - WebSocket JSON-RPC client for Cardano node bridges.
//!
//! This library provides a persistent, reconnecting client for an Ogmios
//! node bridge: request/response correlation over a single WebSocket link,
//! plus a stateful chain-synchronization session that tracks the chain's
//! canonical tip through rollbacks and reconnects.
//!
//! # Architecture
//!
//! The client follows a facade-over-connection model:
//!
//! - **[`Client`]**: Cheap-to-clone facade; owns the connection slot and
//!   rebuilds the link with exponential backoff when it drops
//! - **Connection**: One WebSocket link + event loop + correlation table;
//!   request identifiers are connection-scoped and never reused
//! - **[`ChainSync`]**: Streaming session with a server-confirmed cursor;
//!   resumes from the cursor after a reconnect, never from origin
//!
//! # Quick Start
//!
//! ```no_run
//! use ogmios_client::{ChainEvent, Client, ClientConfig, Point, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::new("ws://127.0.0.1:1337".parse()?);
//!     let client = Client::connect(config).await?;
//!
//!     let mut session = client.chain_sync(vec![Point::Origin]).await?;
//!     loop {
//!         match session.next().await? {
//!             ChainEvent::RollForward { block, .. } => {
//!                 println!("block {} at slot {}", block.id, block.slot);
//!             }
//!             ChainEvent::RollBackward { point, .. } => {
//!                 println!("rolled back to {point}");
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client facade, reconnection, transaction submission |
//! | [`config`] | Endpoint, timeout, and backoff configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | JSON-RPC wire types and chain-sync payloads |
//! | [`sync`] | Chain-synchronization session state machine |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Client facade and connection management.
///
/// Use [`Client::connect`] to dial a bridge, then [`Client::query`],
/// [`Client::submit_transaction`], or [`Client::chain_sync`].
pub mod client;

/// Endpoint, timeout, and backoff configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for requests and sessions.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// JSON-RPC wire types and chain-sync payloads.
pub mod protocol;

/// Chain-synchronization session.
///
/// [`ChainSync`] streams roll events while tracking a server-confirmed
/// cursor across reconnects.
pub mod sync;

/// WebSocket transport layer.
///
/// Internal module handling the connection event loop and request
/// correlation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, TransactionId};

// Configuration types
pub use config::{BackoffOptions, ClientConfig};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, SessionId};

// Protocol types
pub use protocol::{Block, Point, Tip};

// Chain-sync types
pub use sync::{ChainEvent, ChainSync};

// Transport event types
pub use transport::{ClientEvent, DisconnectReason};
