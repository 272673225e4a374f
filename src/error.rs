//! Error types for the Ogmios client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use ogmios_client::{Result, Error};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let tip = client.query("queryNetwork/tip", json!({})).await?;
//!     println!("{tip}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::ReconnectExhausted`] |
//! | Protocol | [`Error::Decode`], [`Error::Protocol`], [`Error::InvalidRequest`], [`Error::MethodNotFound`], [`Error::ServerFault`] |
//! | Session | [`Error::IntersectionNotFound`], [`Error::SessionClosed`] |
//! | Timeout | [`Error::RequestTimeout`] |
//! | External | [`Error::InvalidUrl`], [`Error::Json`], [`Error::WebSocket`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging and for deciding
/// retry eligibility (see [`Error::is_recoverable`]).
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the connection to the node bridge cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout while dialing the endpoint.
    ///
    /// Returned when the WebSocket handshake does not complete within the
    /// configured connection timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    ///
    /// Returned to every caller with an in-flight request when the
    /// connection is lost.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Reconnect attempt budget exhausted.
    ///
    /// Returned when the backoff loop gives up before re-establishing a
    /// connection.
    #[error("Reconnect budget exhausted after {attempts} attempts")]
    ReconnectExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed inbound frame.
    ///
    /// Returned when an inbound frame is not a well-formed JSON-RPC
    /// response or notification.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the malformed frame.
        message: String,
    },

    /// Protocol violation or unexpected message.
    ///
    /// Returned when the server behaves outside the protocol contract.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Server rejected the request as malformed (JSON-RPC -32600/-32700).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Server-reported description.
        message: String,
    },

    /// Server does not know the requested method (JSON-RPC -32601).
    #[error("Method not found: {method}")]
    MethodNotFound {
        /// The unrecognized method name.
        method: String,
    },

    /// Server-reported fault with a protocol-specific code.
    ///
    /// Never retried automatically; retry semantics depend on
    /// caller-specific idempotence.
    #[error("Server fault [{code}]: {message}")]
    ServerFault {
        /// Protocol-specific error code.
        code: i64,
        /// Server-reported message.
        message: String,
        /// Optional structured diagnostic payload.
        data: Option<Value>,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The server has no intersection with the requested points.
    ///
    /// Returned when `findIntersection` fails (Ogmios code 1000), including
    /// on resume when the last confirmed cursor has been pruned or rolled
    /// past. The session never falls back to origin.
    #[error("Intersection not found")]
    IntersectionNotFound,

    /// Chain-sync session is closed.
    ///
    /// Returned when requesting events from a terminated session.
    #[error("Chain-sync session closed")]
    SessionClosed,

    // ========================================================================
    // Timeout Errors
    // ========================================================================
    /// Request timed out waiting for its response.
    ///
    /// Local per-request policy; does not close the connection.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Malformed endpoint URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[inline]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a method not found error.
    #[inline]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Creates a server fault error.
    #[inline]
    pub fn server_fault(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self::ServerFault {
            code,
            message: message.into(),
            data,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a reconnect exhausted error.
    #[inline]
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::ReconnectExhausted { attempts }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::ReconnectExhausted { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the server reported this error.
    #[inline]
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::MethodNotFound { .. } | Self::ServerFault { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry. Server-reported faults are
    /// never recoverable from the client's point of view.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::ConnectionClosed | Self::RequestTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
