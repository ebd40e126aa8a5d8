//! Per-peer Lamport clock ledgers
//!
//! The aggregator enforces strict monotonicity per peer and nothing more:
//! clocks are never merged across peers and never echoed back to callers.
//! Each peer advances its own clock locally and stamps every request.

use std::collections::HashMap;

use thiserror::Error;

use crate::LamportClock;

#[derive(Debug, Error)]
pub enum ClockError {
    /// The incoming value does not strictly exceed the last accepted one.
    #[error("clock {incoming} from {peer} is not after last accepted {last}")]
    OutOfOrder {
        peer: String,
        incoming: LamportClock,
        last: LamportClock,
    },
}

/// A strict-monotonic clock ledger for one class of peers.
///
/// Unknown peers have an implicit last value of 0, so the first accepted
/// request from a peer must carry a clock of at least 1.
#[derive(Debug, Default)]
pub struct LamportLedger {
    entries: HashMap<String, LamportClock>,
}

impl LamportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted value for `peer`, 0 when unseen.
    pub fn last(&self, peer: &str) -> LamportClock {
        self.entries.get(peer).copied().unwrap_or(0)
    }

    /// Accept `incoming` if it is strictly greater than the last accepted
    /// value, recording it and returning the prior value. A prior value of
    /// 0 means this was the peer's first accepted request.
    pub fn try_advance(
        &mut self,
        peer: &str,
        incoming: LamportClock,
    ) -> Result<LamportClock, ClockError> {
        let last = self.last(peer);
        if incoming <= last {
            return Err(ClockError::OutOfOrder {
                peer: peer.to_string(),
                incoming,
                last,
            });
        }
        self.entries.insert(peer.to_string(), incoming);
        Ok(last)
    }

    /// Drop the entry for `peer`, so its next request is first-contact.
    pub fn forget(&mut self, peer: &str) {
        self.entries.remove(peer);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two ledgers the pipeline worker owns: publishers keyed by station
/// id, readers keyed by their remote endpoint string.
#[derive(Debug, Default)]
pub struct ClockRegistry {
    pub publishers: LamportLedger,
    pub readers: LamportLedger,
}

impl ClockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both ledgers (shutdown).
    pub fn clear(&mut self) {
        self.publishers.clear();
        self.readers.clear();
    }
}
