//! Client facade.
//!
//! Composes the transport, correlation, and chain-sync layers into the
//! public operations: [`Client::query`], [`Client::submit_transaction`],
//! and [`Client::chain_sync`]. Owns the reconnect policy.
//!
//! # Reconnection
//!
//! The connection slot is guarded by an async mutex. An operation that
//! finds the connection closed runs the exponential-backoff loop from
//! [`BackoffOptions`](crate::BackoffOptions) before issuing; each
//! successful reconnect installs a fresh connection with a fresh
//! identifier space. Requests that were in flight when the link dropped
//! are failed with `ConnectionClosed`, never replayed: the client cannot
//! assume they are idempotent.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::Point;
use crate::sync::ChainSync;
use crate::transport::connection::SharedEventHandler;
use crate::transport::{ClientEvent, Connection, EventHandler};

// ============================================================================
// TransactionId
// ============================================================================

/// Identifier of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionId {
    /// Hex-encoded 32-byte blake2b digest of the transaction body.
    pub id: String,
}

/// Result envelope of `submitTransaction`.
#[derive(Debug, Deserialize)]
struct SubmitResult {
    transaction: TransactionId,
}

// ============================================================================
// Client
// ============================================================================

/// Shared client state.
pub(crate) struct ClientInner {
    /// Client configuration.
    config: ClientConfig,
    /// Current connection. Replaced wholesale on reconnect.
    connection: AsyncMutex<Connection>,
    /// Observability event handler slot.
    event_handler: SharedEventHandler,
}

/// A client for an Ogmios-style node bridge.
///
/// Cheap to clone; clones share the connection and reconnect policy.
///
/// # Example
///
/// ```no_run
/// use ogmios_client::{Client, ClientConfig, Result};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let config = ClientConfig::new("ws://127.0.0.1:1337".parse()?);
///     let client = Client::connect(config).await?;
///
///     let tip = client.query("queryNetwork/tip", json!({})).await?;
///     println!("tip: {tip}");
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.config.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Connects to the configured endpoint.
    ///
    /// The initial dial is a single attempt; the backoff policy applies to
    /// reconnects after an established connection drops.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the dial exceeds the configured timeout
    /// - [`Error::Connection`] if the dial fails
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let event_handler: SharedEventHandler = Arc::new(Mutex::new(None));

        let connection = Connection::open(
            &config.endpoint,
            config.connection_timeout,
            config.request_timeout,
            Arc::clone(&event_handler),
        )
        .await?;

        info!(endpoint = %config.endpoint, "Client connected");

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                connection: AsyncMutex::new(connection),
                event_handler,
            }),
        })
    }

    /// Returns the configured endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.config.endpoint
    }

    /// Sets the observability event handler.
    ///
    /// The handler is called for connectivity changes, protocol violations,
    /// and server notifications.
    pub fn set_event_handler(&self, handler: impl Fn(ClientEvent) + Send + Sync + 'static) {
        let mut guard = self.inner.event_handler.lock();
        *guard = Some(Box::new(handler) as EventHandler);
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        let mut guard = self.inner.event_handler.lock();
        *guard = None;
    }

    /// Shuts down the current connection gracefully.
    pub async fn shutdown(&self) {
        let guard = self.inner.connection.lock().await;
        guard.shutdown();
    }
}

// ============================================================================
// Client - Operations
// ============================================================================

impl Client {
    /// Issues a request and returns the server's result payload.
    ///
    /// Thin pass-through with no statefulness; server faults are returned
    /// to this caller and never retried.
    ///
    /// # Errors
    ///
    /// - [`Error::ReconnectExhausted`] if the link is down and the backoff budget runs out
    /// - [`Error::ConnectionClosed`] if the link drops while the request is in flight
    /// - [`Error::RequestTimeout`] on deadline
    /// - Mapped server faults for error responses
    pub async fn query(&self, method: &str, params: Value) -> Result<Value> {
        let connection = self.ensure_connected().await?;
        connection.call(method, params).await
    }

    /// Submits an opaque signed transaction.
    ///
    /// # Arguments
    ///
    /// * `cbor` - Hex-encoded CBOR-serialized signed transaction
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Client::query`]; validation faults arrive as
    /// [`Error::ServerFault`] with the node's error code.
    pub async fn submit_transaction(&self, cbor: impl Into<String>) -> Result<TransactionId> {
        let params = json!({ "transaction": { "cbor": cbor.into() } });
        let result = self.query("submitTransaction", params).await?;
        let submit: SubmitResult = serde_json::from_value(result)?;

        debug!(transaction = %submit.transaction.id, "Transaction submitted");
        Ok(submit.transaction)
    }

    /// Starts a chain-sync session from the given candidate points.
    ///
    /// The returned session owns its cursor and yields a single-pass
    /// sequence of roll events; see [`ChainSync`].
    ///
    /// # Errors
    ///
    /// - [`Error::IntersectionNotFound`] if the server has none of the points
    /// - Transport failures as in [`Client::query`]
    pub async fn chain_sync(&self, points: Vec<Point>) -> Result<ChainSync> {
        ChainSync::establish(self.clone(), points).await
    }
}

// ============================================================================
// Client - Internal
// ============================================================================

impl Client {
    /// Returns the live connection, reconnecting with backoff if needed.
    ///
    /// Holding the slot lock across the backoff loop serializes reconnect
    /// attempts: concurrent operations wait for the one reconnect instead
    /// of racing their own.
    pub(crate) async fn ensure_connected(&self) -> Result<Connection> {
        let mut guard = self.inner.connection.lock().await;
        if guard.is_open() {
            return Ok(guard.clone());
        }

        let config = &self.inner.config;
        let backoff = &config.backoff;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if let Some(max_attempts) = backoff.max_attempts
                && attempt > max_attempts
            {
                warn!(attempts = max_attempts, "Reconnect budget exhausted");
                return Err(Error::reconnect_exhausted(max_attempts));
            }

            tokio::time::sleep(backoff.delay_for_attempt(attempt)).await;

            match Connection::open(
                &config.endpoint,
                config.connection_timeout,
                config.request_timeout,
                Arc::clone(&self.inner.event_handler),
            )
            .await
            {
                Ok(connection) => {
                    info!(endpoint = %config.endpoint, attempt, "Reconnected");
                    *guard = connection.clone();
                    self.emit(ClientEvent::Connected {
                        endpoint: config.endpoint.clone(),
                    });
                    return Ok(connection);
                }

                Err(e) => {
                    warn!(attempt, error = %e, "Reconnect attempt failed");
                }
            }
        }
    }

    /// Invokes the event handler, if one is installed.
    pub(crate) fn emit(&self, event: ClientEvent) {
        let guard = self.inner.event_handler.lock();
        if let Some(handler) = guard.as_ref() {
            handler(event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
