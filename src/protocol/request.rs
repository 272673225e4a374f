//! Request and Response envelope types.
//!
//! Defines the JSON-RPC 2.0 message format exchanged with the node bridge
//! and the mapping from server fault codes to typed errors.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// Constants
// ============================================================================

/// JSON-RPC protocol version sent with every request.
const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC: request object malformed.
const CODE_INVALID_REQUEST: i64 = -32600;

/// JSON-RPC: method unknown to the server.
const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC: request not parseable.
const CODE_PARSE_ERROR: i64 = -32700;

/// Ogmios: no intersection with the requested points.
const CODE_INTERSECTION_NOT_FOUND: i64 = 1000;

// ============================================================================
// Request
// ============================================================================

/// A JSON-RPC request from client to server.
///
/// # Format
///
/// ```json
/// {
///   "jsonrpc": "2.0",
///   "method": "findIntersection",
///   "params": { ... },
///   "id": 1
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Protocol version (always "2.0").
    pub jsonrpc: &'static str,

    /// Method name.
    pub method: String,

    /// Method parameters.
    pub params: Value,

    /// Identifier for request/response correlation.
    pub id: RequestId,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id,
        }
    }

    /// Encodes the request as a WebSocket text frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the parameters cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// RpcFault
// ============================================================================

/// A server-reported error object.
///
/// # Format
///
/// ```json
/// { "code": 1000, "message": "No intersection found", "data": { ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcFault {
    /// Protocol error code.
    pub code: i64,

    /// Human-readable message.
    pub message: String,

    /// Optional structured diagnostic payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcFault {
    /// Maps the fault to a typed error.
    ///
    /// Standard JSON-RPC codes and the chain-sync intersection code get
    /// dedicated variants; everything else is a generic server fault.
    #[must_use]
    pub fn into_error(self, method: &str) -> Error {
        match self.code {
            CODE_INVALID_REQUEST | CODE_PARSE_ERROR => Error::invalid_request(self.message),
            CODE_METHOD_NOT_FOUND => Error::method_not_found(method),
            CODE_INTERSECTION_NOT_FOUND => Error::IntersectionNotFound,
            code => Error::server_fault(code, self.message, self.data),
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A decoded response from the server.
///
/// Carries either the result payload or the server fault for the request
/// identified by `id`.
#[derive(Debug, Clone)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Method name echoed by the server, when present.
    pub method: Option<String>,

    /// Result payload or server fault.
    pub outcome: std::result::Result<Value, RpcFault>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Extracts the result value, mapping a fault to a typed error.
    ///
    /// # Errors
    ///
    /// Returns the mapped server fault if the response carried an error
    /// object.
    pub fn into_result(self) -> Result<Value> {
        let method = self.method.unwrap_or_default();
        match self.outcome {
            Ok(value) => Ok(value),
            Err(fault) => Err(fault.into_error(&method)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
