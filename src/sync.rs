//! Chain-sync session.
//!
//! A stateful streaming session tracking the chain's canonical tip. The
//! session owns a cursor: the last point the server has explicitly
//! confirmed, either as an intersection or as a delivered roll event. The
//! cursor is never speculatively advanced.
//!
//! # State Machine
//!
//! ```text
//!            findIntersection          nextBlock
//!   Idle ──────────────────► Synced ─────────────► Streaming ──┐
//!    ▲  ◄── notFound ──┘        ▲                     │        │ close
//!    │                          └── RollForward / ────┘        ▼
//!    └───── transport drop ───────  RollBackward            Closed
//! ```
//!
//! On a transport drop while streaming, the session re-establishes the
//! intersection from the last confirmed cursor once a fresh connection is
//! up. If the server no longer has that point, the session fails with
//! `IntersectionNotFound` rather than silently resuming from origin.
//!
//! # Delivery Semantics
//!
//! The event sequence is single-pass and non-restartable. Consumers must
//! durably process each event before requesting the next one: after a
//! reconnect the stream resumes from the last acknowledged cursor, not
//! from session start.

// ============================================================================
// Imports
// ============================================================================

use serde_json::json;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{
    Block, FindIntersectionParams, FindIntersectionResult, NextBlockResult, Point, Tip,
};
use crate::transport::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Method establishing the session cursor.
const FIND_INTERSECTION: &str = "findIntersection";

/// Method requesting the next roll event.
const NEXT_BLOCK: &str = "nextBlock";

// ============================================================================
// ChainEvent
// ============================================================================

/// One element of the chain-event sequence.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// The chain extended; `block` is the direct successor of the cursor.
    RollForward {
        /// The new block. Its point is the new cursor.
        block: Block,
        /// Server tip after this block.
        tip: Tip,
    },

    /// A previously reported block is no longer canonical.
    RollBackward {
        /// The exact point the cursor was rewound to.
        point: Point,
        /// Server tip after the rollback.
        tip: Tip,
    },
}

// ============================================================================
// SyncState
// ============================================================================

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// No server-side session; next step is `findIntersection`.
    Idle,

    /// `findIntersection` outstanding.
    Intersecting,

    /// Intersection confirmed, cursor set, no `nextBlock` issued yet.
    Synced,

    /// Repeatedly requesting and receiving roll events.
    Streaming,

    /// Terminal; no further events.
    Closed,
}

// ============================================================================
// ChainSync
// ============================================================================

/// Handle to an active chain-sync session.
///
/// Created by [`Client::chain_sync`]. `next` takes `&mut self`: the event
/// sequence has exactly one consumer.
pub struct ChainSync {
    /// Owning client, used for reconnection.
    client: Client,
    /// Connection the current intersection was established on.
    connection: Connection,
    /// Session identifier, for diagnostics.
    session_id: SessionId,
    /// Lifecycle state.
    state: SyncState,
    /// Last server-confirmed point.
    cursor: Point,
    /// Last reported server tip.
    tip: Option<Tip>,
}

impl ChainSync {
    /// Establishes a session from the given candidate points.
    pub(crate) async fn establish(client: Client, points: Vec<Point>) -> Result<Self> {
        let connection = client.ensure_connected().await?;
        let session_id = SessionId::generate();

        let mut session = Self {
            client,
            connection,
            session_id,
            state: SyncState::Idle,
            cursor: Point::Origin,
            tip: None,
        };
        session.find_intersection(points).await?;

        info!(session = %session.session_id, cursor = %session.cursor, "Chain-sync established");
        Ok(session)
    }

    /// Returns the session identifier.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the last server-confirmed cursor.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> &Point {
        &self.cursor
    }

    /// Returns the last reported server tip, if any.
    #[inline]
    #[must_use]
    pub fn tip(&self) -> Option<&Tip> {
        self.tip.as_ref()
    }

    /// Returns `true` if the session is terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == SyncState::Closed
    }

    /// Produces the next chain event.
    ///
    /// Suspends until the server delivers a roll event. On a transport
    /// drop, transparently reconnects (within the backoff budget) and
    /// resumes from the last confirmed cursor before yielding.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] after [`ChainSync::close`]
    /// - [`Error::IntersectionNotFound`] if the cursor is no longer on the
    ///   server's chain after a reconnect
    /// - [`Error::ReconnectExhausted`] when the backoff budget runs out
    pub async fn next(&mut self) -> Result<ChainEvent> {
        loop {
            match self.state {
                SyncState::Closed => return Err(Error::SessionClosed),

                SyncState::Idle | SyncState::Intersecting => {
                    let cursor = self.cursor.clone();
                    self.find_intersection(vec![cursor]).await?;
                }

                SyncState::Synced | SyncState::Streaming => {
                    if !self.connection.is_open() {
                        self.state = SyncState::Idle;
                        continue;
                    }

                    match self.connection.call(NEXT_BLOCK, json!({})).await {
                        Ok(value) => {
                            let result: NextBlockResult = serde_json::from_value(value)?;
                            return Ok(self.apply(result));
                        }

                        // Transport interruption: the server-side session is
                        // gone, but the cursor still names a confirmed point.
                        // Re-intersect there instead of surfacing the drop.
                        Err(e) if e.is_transport_error() || e.is_timeout() => {
                            debug!(
                                session = %self.session_id,
                                cursor = %self.cursor,
                                error = %e,
                                "Stream interrupted; resuming from cursor"
                            );
                            self.state = SyncState::Idle;
                        }

                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    /// Terminates the session. No further events are produced.
    pub fn close(&mut self) {
        debug!(session = %self.session_id, "Chain-sync session closed");
        self.state = SyncState::Closed;
    }

    /// Negotiates the session cursor with the server.
    ///
    /// On resume this is called with exactly the last confirmed cursor;
    /// the session never widens the candidate set back to origin.
    async fn find_intersection(&mut self, points: Vec<Point>) -> Result<()> {
        if !self.connection.is_open() {
            self.connection = match self.client.ensure_connected().await {
                Ok(connection) => connection,
                Err(e) => {
                    self.state = SyncState::Idle;
                    return Err(e);
                }
            };
        }

        self.state = SyncState::Intersecting;
        let params = serde_json::to_value(FindIntersectionParams { points })?;

        match self.connection.call(FIND_INTERSECTION, params).await {
            Ok(value) => {
                let result: FindIntersectionResult = serde_json::from_value(value)?;
                debug!(
                    session = %self.session_id,
                    intersection = %result.intersection,
                    "Intersection confirmed"
                );
                self.cursor = result.intersection;
                self.tip = Some(result.tip);
                self.state = SyncState::Synced;
                Ok(())
            }

            // The cursor is left untouched: IntersectionNotFound must
            // surface with the point that was rejected still in hand.
            Err(e) => {
                self.state = SyncState::Idle;
                Err(e)
            }
        }
    }

    /// Applies a confirmed roll event to the cursor.
    fn apply(&mut self, result: NextBlockResult) -> ChainEvent {
        self.state = SyncState::Streaming;

        match result {
            NextBlockResult::Forward { block, tip } => {
                self.cursor = block.point();
                self.tip = Some(tip.clone());
                ChainEvent::RollForward { block, tip }
            }

            NextBlockResult::Backward { point, tip } => {
                self.cursor = point.clone();
                self.tip = Some(tip.clone());
                ChainEvent::RollBackward { point, tip }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::Value;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::WebSocketStream;
    use tokio_tungstenite::tungstenite::Message;
    use url::Url;

    use crate::config::{BackoffOptions, ClientConfig};

    type ServerWs = WebSocketStream<TcpStream>;

    async fn bind() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let endpoint = format!("ws://{addr}").parse().expect("url");
        (listener, endpoint)
    }

    async fn accept(listener: &TcpListener) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade")
    }

    async fn read_request(ws: &mut ServerWs) -> Value {
        loop {
            match ws.next().await.expect("frame").expect("message") {
                Message::Text(text) => return serde_json::from_str(&text).expect("json"),
                _ => continue,
            }
        }
    }

    async fn reply(ws: &mut ServerWs, request: &Value, result: Value) {
        let frame = json!({
            "jsonrpc": "2.0",
            "method": request["method"],
            "result": result,
            "id": request["id"]
        });
        ws.send(Message::Text(frame.to_string().into()))
            .await
            .expect("send");
    }

    async fn reply_error(ws: &mut ServerWs, request: &Value, code: i64, message: &str) {
        let frame = json!({
            "jsonrpc": "2.0",
            "method": request["method"],
            "error": { "code": code, "message": message },
            "id": request["id"]
        });
        ws.send(Message::Text(frame.to_string().into()))
            .await
            .expect("send");
    }

    fn tip_json() -> Value {
        json!({ "slot": 1000, "id": "feed", "height": 100 })
    }

    /// Serves findIntersection confirming the first candidate point.
    async fn serve_intersection(ws: &mut ServerWs) -> Value {
        let request = read_request(ws).await;
        assert_eq!(request["method"], "findIntersection");
        let point = request["params"]["points"][0].clone();
        reply(
            ws,
            &request,
            json!({ "intersection": point, "tip": tip_json() }),
        )
        .await;
        point
    }

    /// Serves one nextBlock with a forward roll to the given slot.
    async fn serve_forward(ws: &mut ServerWs, slot: u64, id: &str) {
        let request = read_request(ws).await;
        assert_eq!(request["method"], "nextBlock");
        reply(
            ws,
            &request,
            json!({
                "direction": "forward",
                "block": { "id": id, "slot": slot, "height": slot },
                "tip": tip_json()
            }),
        )
        .await;
    }

    fn config(endpoint: Url) -> ClientConfig {
        ClientConfig::new(endpoint)
            .with_connection_timeout(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(5))
            .with_backoff(
                BackoffOptions::new()
                    .with_initial_delay(Duration::from_millis(10))
                    .with_max_delay(Duration::from_millis(50))
                    .with_max_attempts(5),
            )
    }

    #[tokio::test]
    async fn test_forward_and_backward_move_cursor() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            serve_intersection(&mut ws).await;
            serve_forward(&mut ws, 501, "b1").await;
            serve_forward(&mut ws, 502, "b2").await;

            let request = read_request(&mut ws).await;
            reply(
                &mut ws,
                &request,
                json!({
                    "direction": "backward",
                    "point": { "slot": 400, "id": "aa" },
                    "tip": tip_json()
                }),
            )
            .await;
        });

        let client = Client::connect(config(endpoint)).await.expect("connect");
        let mut session = client
            .chain_sync(vec![Point::block(500, "xyz")])
            .await
            .expect("establish");

        assert_eq!(session.cursor(), &Point::block(500, "xyz"));

        match session.next().await.expect("event") {
            ChainEvent::RollForward { block, .. } => assert_eq!(block.id, "b1"),
            ChainEvent::RollBackward { .. } => panic!("expected forward"),
        }
        assert_eq!(session.cursor(), &Point::block(501, "b1"));

        session.next().await.expect("event");
        assert_eq!(session.cursor(), &Point::block(502, "b2"));

        match session.next().await.expect("event") {
            ChainEvent::RollBackward { point, .. } => {
                assert_eq!(point, Point::block(400, "aa"));
            }
            ChainEvent::RollForward { .. } => panic!("expected backward"),
        }
        assert_eq!(session.cursor(), &Point::block(400, "aa"));
    }

    #[tokio::test]
    async fn test_intersection_not_found_fails_session() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let request = read_request(&mut ws).await;
            reply_error(&mut ws, &request, 1000, "No intersection found").await;
        });

        let client = Client::connect(config(endpoint)).await.expect("connect");
        let result = client.chain_sync(vec![Point::block(500, "xyz")]).await;

        assert!(matches!(result, Err(Error::IntersectionNotFound)));
    }

    #[tokio::test]
    async fn test_resume_reintersects_at_last_cursor() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            // First connection: intersect, three forwards, then drop.
            let mut ws = accept(&listener).await;
            serve_intersection(&mut ws).await;
            serve_forward(&mut ws, 501, "b1").await;
            serve_forward(&mut ws, 502, "b2").await;
            serve_forward(&mut ws, 503, "b3").await;
            drop(ws);

            // Second connection: the session must re-intersect with exactly
            // the cursor from the third event.
            let mut ws = accept(&listener).await;
            let request = read_request(&mut ws).await;
            assert_eq!(request["method"], "findIntersection");
            assert_eq!(
                request["params"]["points"],
                json!([{ "slot": 503, "id": "b3" }])
            );
            reply(
                &mut ws,
                &request,
                json!({
                    "intersection": { "slot": 503, "id": "b3" },
                    "tip": tip_json()
                }),
            )
            .await;
            serve_forward(&mut ws, 504, "b4").await;
        });

        let client = Client::connect(config(endpoint)).await.expect("connect");
        let mut session = client
            .chain_sync(vec![Point::block(500, "xyz")])
            .await
            .expect("establish");

        for _ in 0..3 {
            session.next().await.expect("event");
        }
        assert_eq!(session.cursor(), &Point::block(503, "b3"));

        // The fourth event arrives through the resumed session.
        match session.next().await.expect("event") {
            ChainEvent::RollForward { block, .. } => assert_eq!(block.id, "b4"),
            ChainEvent::RollBackward { .. } => panic!("expected forward"),
        }
        assert_eq!(session.cursor(), &Point::block(504, "b4"));
    }

    #[tokio::test]
    async fn test_resume_rejected_surfaces_not_found() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            serve_intersection(&mut ws).await;
            serve_forward(&mut ws, 501, "b1").await;
            drop(ws);

            // The cursor has been pruned server-side; no origin fallback.
            let mut ws = accept(&listener).await;
            let request = read_request(&mut ws).await;
            assert_eq!(request["method"], "findIntersection");
            reply_error(&mut ws, &request, 1000, "No intersection found").await;
        });

        let client = Client::connect(config(endpoint)).await.expect("connect");
        let mut session = client
            .chain_sync(vec![Point::block(500, "xyz")])
            .await
            .expect("establish");

        session.next().await.expect("event");
        assert_eq!(session.cursor(), &Point::block(501, "b1"));

        let result = session.next().await;
        assert!(matches!(result, Err(Error::IntersectionNotFound)));

        // The rejected cursor stays in hand.
        assert_eq!(session.cursor(), &Point::block(501, "b1"));
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            serve_intersection(&mut ws).await;
            // Hold the link open.
            let _ = read_request(&mut ws).await;
        });

        let client = Client::connect(config(endpoint)).await.expect("connect");
        let mut session = client
            .chain_sync(vec![Point::Origin])
            .await
            .expect("establish");

        session.close();
        assert!(session.is_closed());

        let result = session.next().await;
        assert!(matches!(result, Err(Error::SessionClosed)));
    }
}
