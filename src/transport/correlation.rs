//! Request identifier allocation and in-flight tracking.
//!
//! The correlation table is the single shared mutable structure of the
//! transport. It allocates connection-scoped request identifiers, holds the
//! completion slot for every in-flight request, and guarantees that each
//! slot is fulfilled exactly once: by the matching response, by cancellation,
//! or by the disconnect drain.
//!
//! Identifiers are monotonically increasing and never reused within a
//! connection's lifetime. The table is mutex-guarded; both the caller side
//! (allocate + insert) and the event loop (resolve, drain) go through the
//! same lock, which is what resolves the disconnect-vs-late-response race
//! deterministically.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::Response;

// ============================================================================
// Constants
// ============================================================================

/// Maximum in-flight requests before rejecting new ones.
const MAX_IN_FLIGHT: usize = 100;

/// Maximum remembered cancelled identifiers. Oldest tombstones are evicted
/// first; a response arriving after eviction is reported as unknown.
const MAX_CANCELLED: usize = 256;

// ============================================================================
// Types
// ============================================================================

/// Completion slot for one in-flight request.
type Completion = oneshot::Sender<Result<Response>>;

/// Outcome of routing a response into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The response was delivered to its waiting caller.
    Delivered,

    /// The caller cancelled; the response was discarded silently.
    Cancelled,

    /// No pending request matches this identifier.
    Unknown,
}

// ============================================================================
// PendingRequest
// ============================================================================

/// One in-flight JSON-RPC call.
pub(crate) struct PendingRequest {
    /// Method name, for diagnostics.
    pub method: String,

    /// Single-fulfillment completion slot.
    pub completion: Completion,

    /// When the call was issued.
    pub issued_at: Instant,
}

// ============================================================================
// CorrelationTable
// ============================================================================

/// Identifier allocator and in-flight request table for one connection.
///
/// Destroyed with its connection; a reconnect starts from a fresh table
/// with a fresh identifier space.
pub struct CorrelationTable {
    /// Next identifier to hand out.
    next_id: RequestId,

    /// In-flight requests by identifier.
    pending: FxHashMap<RequestId, PendingRequest>,

    /// Identifiers withdrawn by timeout or caller cancellation. A late
    /// response for one of these is discarded silently instead of being
    /// reported as a protocol violation. Bounded at [`MAX_CANCELLED`];
    /// `cancelled_order` tracks insertion order for eviction.
    cancelled: FxHashSet<RequestId>,

    /// Cancellation order, oldest first.
    cancelled_order: VecDeque<RequestId>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    /// Creates an empty table. Identifiers start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: RequestId::new(1),
            pending: FxHashMap::default(),
            cancelled: FxHashSet::default(),
            cancelled_order: VecDeque::new(),
        }
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no requests are in flight.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Allocates the next request identifier.
    pub fn allocate(&mut self) -> RequestId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        id
    }

    /// Records an in-flight request under the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] when the in-flight cap is reached.
    pub(crate) fn insert(
        &mut self,
        id: RequestId,
        method: impl Into<String>,
        completion: Completion,
    ) -> Result<()> {
        if self.pending.len() >= MAX_IN_FLIGHT {
            return Err(Error::protocol(format!(
                "too many in-flight requests: {}/{}",
                self.pending.len(),
                MAX_IN_FLIGHT
            )));
        }

        debug_assert!(!self.pending.contains_key(&id), "request id reused");

        self.pending.insert(
            id,
            PendingRequest {
                method: method.into(),
                completion,
                issued_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Routes a response to its waiting caller.
    ///
    /// The entry is removed regardless of outcome, so a second frame with
    /// the same identifier reports [`ResolveOutcome::Unknown`].
    pub fn resolve(&mut self, response: Response) -> ResolveOutcome {
        match self.pending.remove(&response.id) {
            Some(pending) => match pending.completion.send(Ok(response)) {
                Ok(()) => ResolveOutcome::Delivered,
                Err(_) => ResolveOutcome::Cancelled,
            },
            None if self.cancelled.remove(&response.id) => ResolveOutcome::Cancelled,
            None => ResolveOutcome::Unknown,
        }
    }

    /// Removes a pending request without fulfilling it.
    ///
    /// Used by timeout and caller-side cancellation. The identifier is
    /// remembered so a late response for it is discarded without being
    /// flagged as unknown. Returns the removed entry, if it was still
    /// present.
    pub(crate) fn cancel(&mut self, id: RequestId) -> Option<PendingRequest> {
        let removed = self.pending.remove(&id);
        if removed.is_some() && self.cancelled.insert(id) {
            self.cancelled_order.push_back(id);
            if self.cancelled_order.len() > MAX_CANCELLED
                && let Some(evicted) = self.cancelled_order.pop_front()
            {
                self.cancelled.remove(&evicted);
            }
        }
        removed
    }

    /// Fails every in-flight request with `ConnectionClosed`.
    ///
    /// Entries are drained in ascending identifier order. Returns the
    /// identifiers that were failed, leaving the table empty.
    pub fn fail_all(&mut self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.pending.keys().copied().collect();
        ids.sort_unstable();

        for id in &ids {
            if let Some(pending) = self.pending.remove(id) {
                let _ = pending.completion.send(Err(Error::ConnectionClosed));
            }
        }

        ids
    }
}

// ============================================================================
// Tests
// ============================================================================
