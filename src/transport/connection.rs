//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to the node bridge,
//! including request/response correlation and notification routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Inbound frames from the bridge (responses, notifications)
//! - Outbound requests from the client API
//! - Request/response correlation by connection-scoped integer id
//! - Disconnect fan-out: every in-flight request fails with
//!   `ConnectionClosed`, in identifier order
//!
//! Exactly one task reads and dispatches inbound frames, so correlation
//! state is never observed concurrently from two frame-handling contexts.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Frame, Request, Response, decode_frame};
use crate::transport::correlation::{CorrelationTable, ResolveOutcome};

// ============================================================================
// Types
// ============================================================================

/// Write half of the WebSocket stream.
type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Event handler callback type.
///
/// Called for connectivity changes, protocol violations, and server
/// notifications. Intended for the observability sink; not a control path.
pub type EventHandler = Box<dyn Fn(ClientEvent) + Send + Sync>;

/// Shared event-handler slot, installed by the client facade.
pub(crate) type SharedEventHandler = Arc<Mutex<Option<EventHandler>>>;

// ============================================================================
// ClientEvent
// ============================================================================

/// Why a connection terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Close handshake completed or shutdown requested.
    Graceful,

    /// The link failed with a network error.
    Network(String),
}

/// An observability event from the client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A connection to the endpoint was established.
    Connected {
        /// The endpoint that was dialed.
        endpoint: Url,
    },

    /// The connection terminated.
    Disconnected {
        /// Terminating reason.
        reason: DisconnectReason,
    },

    /// An inbound frame violated the protocol and was dropped.
    ProtocolViolation {
        /// What was wrong with the frame.
        detail: String,
    },

    /// A server push message without a correlation id.
    Notification {
        /// Method name of the push message.
        method: String,
        /// Message payload.
        params: Value,
    },
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// WebSocket handshake in progress.
    Connecting,

    /// Link established, requests accepted.
    Open,

    /// Shutdown requested, close handshake in progress.
    Closing,

    /// Terminated. A fresh connection replaces this one; it is never
    /// reopened.
    Closed,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send an already-registered request over the socket.
    Send {
        request: Request,
    },
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// One live WebSocket session with the node bridge.
///
/// Owns the socket through its internal event loop task. Destroyed and
/// recreated on reconnect; correlation identifiers never span connections.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and can be shared across tasks. Requests
/// may be issued concurrently; identifier allocation is mutex-guarded.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation table (shared with the event loop).
    correlation: Arc<Mutex<CorrelationTable>>,
    /// Connection state (written by the event loop).
    state_rx: watch::Receiver<ConnectionState>,
    /// Per-request deadline.
    request_timeout: Duration,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            state_rx: self.state_rx.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl Connection {
    /// Dials the endpoint and spawns the event loop.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds `connection_timeout`
    /// - [`Error::Connection`] if the dial fails
    pub(crate) async fn open(
        endpoint: &Url,
        connection_timeout: Duration,
        request_timeout: Duration,
        event_handler: SharedEventHandler,
    ) -> Result<Self> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let dial = connect_async(endpoint.as_str());
        let (ws_stream, _) = timeout(connection_timeout, dial)
            .await
            .map_err(|_| Error::connection_timeout(connection_timeout.as_millis() as u64))?
            .map_err(|e| Error::connection(e.to_string()))?;

        debug!(endpoint = %endpoint, "WebSocket connection established");
        let _ = state_tx.send(ConnectionState::Open);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationTable::new()));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            event_handler,
            state_tx,
        ));

        Ok(Self {
            command_tx,
            correlation,
            state_rx,
            request_timeout,
        })
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Returns `true` if the connection accepts requests.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Issues a request and waits for its correlated response.
    ///
    /// The returned future resolves exactly once: with the matching
    /// response, with [`Error::ConnectionClosed`] if the link drops while
    /// the request is outstanding, or with [`Error::RequestTimeout`] if no
    /// response arrives within the configured deadline. Timing out does not
    /// close the connection; other in-flight requests are unaffected.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is gone
    /// - [`Error::RequestTimeout`] on deadline
    /// - [`Error::Protocol`] if too many requests are in flight
    /// - Mapped server faults for error responses
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let (response_tx, response_rx) = oneshot::channel();

        // Allocate the id and register the completion slot under one lock
        // so concurrent callers cannot interleave.
        let request = {
            let mut table = self.correlation.lock();
            let id = table.allocate();
            table.insert(id, method, response_tx)?;
            Request::new(id, method, params)
        };
        let request_id = request.id;

        if self
            .command_tx
            .send(ConnectionCommand::Send { request })
            .is_err()
        {
            self.correlation.lock().cancel(request_id);
            return Err(Error::ConnectionClosed);
        }

        trace!(%request_id, method, "Request issued");

        match timeout(self.request_timeout, response_rx).await {
            Ok(Ok(result)) => result?.into_result(),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                // Deadline reached: withdraw the pending entry. Any late
                // response for this id is discarded as unknown.
                self.correlation.lock().cancel(request_id);
                debug!(%request_id, "Request timed out");

                Err(Error::request_timeout(
                    request_id,
                    self.request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Shuts down the connection gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that owns the WebSocket.
    async fn run_event_loop(
        ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationTable>>,
        event_handler: SharedEventHandler,
        state_tx: watch::Sender<ConnectionState>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let reason = loop {
            tokio::select! {
                // Inbound frames from the bridge
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_frame(&text, &correlation, &event_handler);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break DisconnectReason::Graceful;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break DisconnectReason::Network(e.to_string());
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break DisconnectReason::Network("stream ended".to_string());
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the client API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request }) => {
                            Self::handle_send(request, &mut ws_write, &correlation).await;
                        }

                        Some(ConnectionCommand::Shutdown) | None => {
                            debug!("Shutdown requested");
                            let _ = state_tx.send(ConnectionState::Closing);
                            let _ = ws_write.close().await;
                            break DisconnectReason::Graceful;
                        }
                    }
                }
            }
        };

        let _ = state_tx.send(ConnectionState::Closed);

        // Single synchronization point for the disconnect-vs-late-response
        // race: drain the table once, in identifier order.
        let failed = correlation.lock().fail_all();
        if !failed.is_empty() {
            debug!(count = failed.len(), "Failed in-flight requests on disconnect");
        }

        Self::emit(&event_handler, ClientEvent::Disconnected { reason });

        debug!("Event loop terminated");
    }

    /// Handles an inbound text frame.
    fn handle_frame(
        text: &str,
        correlation: &Arc<Mutex<CorrelationTable>>,
        event_handler: &SharedEventHandler,
    ) {
        match decode_frame(text) {
            Ok(Frame::Response(response)) => {
                Self::route_response(response, correlation, event_handler);
            }

            Ok(Frame::Notification { method, params }) => {
                trace!(method, "Notification received");
                Self::emit(event_handler, ClientEvent::Notification { method, params });
            }

            // Malformed frames are dropped and recorded; the frame
            // processing path keeps running.
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame");
                Self::emit(
                    event_handler,
                    ClientEvent::ProtocolViolation {
                        detail: e.to_string(),
                    },
                );
            }
        }
    }

    /// Routes a response to its in-flight request.
    fn route_response(
        response: Response,
        correlation: &Arc<Mutex<CorrelationTable>>,
        event_handler: &SharedEventHandler,
    ) {
        let id = response.id;
        match correlation.lock().resolve(response) {
            ResolveOutcome::Delivered => {
                trace!(request_id = %id, "Response delivered");
            }

            ResolveOutcome::Cancelled => {
                trace!(request_id = %id, "Response for cancelled request discarded");
            }

            ResolveOutcome::Unknown => {
                warn!(request_id = %id, "Response for unknown request");
                Self::emit(
                    event_handler,
                    ClientEvent::ProtocolViolation {
                        detail: format!("response for unknown request id {id}"),
                    },
                );
            }
        }
    }

    /// Sends a registered request over the socket.
    async fn handle_send(
        request: Request,
        ws_write: &mut WsSink,
        correlation: &Arc<Mutex<CorrelationTable>>,
    ) {
        let request_id = request.id;

        let json = match request.encode() {
            Ok(j) => j,
            Err(e) => {
                if let Some(pending) = correlation.lock().cancel(request_id) {
                    let _ = pending.completion.send(Err(e));
                }
                return;
            }
        };

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            if let Some(pending) = correlation.lock().cancel(request_id) {
                let _ = pending.completion.send(Err(Error::connection(e.to_string())));
            }
            return;
        }

        trace!(%request_id, "Request sent");
    }

    /// Invokes the event handler, if one is installed.
    fn emit(event_handler: &SharedEventHandler, event: ClientEvent) {
        let guard = event_handler.lock();
        if let Some(handler) = guard.as_ref() {
            handler(event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
