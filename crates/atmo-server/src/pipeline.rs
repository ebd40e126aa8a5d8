//! Single-writer request pipeline
//!
//! Handlers enqueue validated work items on a bounded FIFO; one worker task
//! drains it and applies each item against the snapshot store. The worker
//! is the only owner of the clock ledgers, so PUTs, GETs, and sweeps are
//! totally ordered by enqueue order. A request that fails validation or IO
//! completes its reply slot with the mapped status; nothing a request does
//! terminates the worker.

use std::sync::Arc;

use atmo_core::{codec, ClockRegistry, LamportClock};
use atmo_proto::Status;
use atmo_store::SnapshotStore;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::sweep;

/// Outcome of one work item, handed back through the item's reply slot.
#[derive(Debug)]
pub struct Reply {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn with_body(status: Status, body: Vec<u8>) -> Self {
        Self { status, body }
    }
}

/// One-shot completion slot the connection handler awaits.
pub type ReplySlot = oneshot::Sender<Reply>;

/// A unit of work for the pipeline worker.
#[derive(Debug)]
pub enum WorkItem {
    /// Store one observation. The publisher identity is the station id
    /// inside the payload, resolved by the worker after decode.
    Put {
        payload: Vec<u8>,
        clock: LamportClock,
        reply: ReplySlot,
    },

    /// Return the current aggregate, optionally filtered by station id.
    /// The reader identity is the remote endpoint string.
    Get {
        peer: String,
        station_id: Option<String>,
        clock: LamportClock,
        reply: ReplySlot,
    },

    /// Internal: evict expired records and their publisher clocks.
    Sweep,
}

/// Cloneable producer half of the FIFO.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<WorkItem>,
}

impl PipelineHandle {
    /// Non-blocking offer. Returns the item back when the FIFO is full or
    /// the worker is gone, so the dispatcher can answer 503.
    pub fn try_submit(&self, item: WorkItem) -> Result<(), WorkItem> {
        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(item) => item,
            mpsc::error::TrySendError::Closed(item) => item,
        })
    }
}

/// The running pipeline: producer handle plus worker lifecycle.
pub struct Pipeline {
    handle: PipelineHandle,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Pipeline {
    /// Spawn the worker over a fresh bounded FIFO.
    pub fn start(
        store: Arc<Mutex<SnapshotStore>>,
        expiry_seconds: i64,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_worker(rx, stop_rx, store, expiry_seconds));
        Self {
            handle: PipelineHandle { tx },
            stop_tx,
            task,
        }
    }

    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    /// Stop the worker: discard queued items, clear both clock ledgers.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        drop(self.handle);
        if let Err(e) = self.task.await {
            error!(error = %e, "pipeline worker task failed");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<WorkItem>,
    mut stop_rx: watch::Receiver<bool>,
    store: Arc<Mutex<SnapshotStore>>,
    expiry_seconds: i64,
) {
    let mut worker = Worker {
        store,
        clocks: ClockRegistry::new(),
        expiry_seconds,
    };

    loop {
        tokio::select! {
            item = rx.recv() => match item {
                Some(item) => worker.apply(item).await,
                None => break,
            },
            _ = stop_rx.changed() => break,
        }
    }

    // Empty the FIFO without applying what is left; clear ledger state.
    rx.close();
    while rx.try_recv().is_ok() {}
    worker.clocks.clear();
    info!("pipeline worker stopped");
}

struct Worker {
    store: Arc<Mutex<SnapshotStore>>,
    clocks: ClockRegistry,
    expiry_seconds: i64,
}

impl Worker {
    async fn apply(&mut self, item: WorkItem) {
        match item {
            WorkItem::Put {
                payload,
                clock,
                reply,
            } => {
                let outcome = self.process_put(payload, clock).await;
                let _ = reply.send(outcome);
            }
            WorkItem::Get {
                peer,
                station_id,
                clock,
                reply,
            } => {
                let outcome = self.process_get(&peer, station_id, clock).await;
                let _ = reply.send(outcome);
            }
            WorkItem::Sweep => self.process_sweep().await,
        }
    }

    async fn process_put(&mut self, payload: Vec<u8>, clock: LamportClock) -> Reply {
        let mut record = match codec::decode_record(&payload) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "PUT payload did not decode");
                return Reply::empty(Status::InternalServerError);
            }
        };

        if !record.has_id() {
            return Reply::empty(Status::BadRequest);
        }

        let prior = match self.clocks.publishers.try_advance(&record.id, clock) {
            Ok(prior) => prior,
            Err(e) => {
                debug!(error = %e, "rejected out-of-order PUT");
                return Reply::empty(Status::BadRequest);
            }
        };

        record.last_updated = Utc::now().timestamp();
        let station = record.id.clone();

        {
            let store = self.store.lock().await;
            let mut records = store.load();
            records.retain(|r| r.id != station);
            records.push(record);
            if let Err(e) = store.save(&records) {
                error!(station = %station, error = %e, "failed to persist update");
                return Reply::empty(Status::InternalServerError);
            }
        }

        debug!(station = %station, clock, "stored observation");
        if prior == 0 {
            Reply::empty(Status::Created)
        } else {
            Reply::empty(Status::Ok)
        }
    }

    async fn process_get(
        &mut self,
        peer: &str,
        station_id: Option<String>,
        clock: LamportClock,
    ) -> Reply {
        if let Err(e) = self.clocks.readers.try_advance(peer, clock) {
            debug!(error = %e, "rejected out-of-order GET");
            return Reply::empty(Status::BadRequest);
        }

        let now = Utc::now().timestamp();
        let records = {
            let store = self.store.lock().await;
            let mut records = store.load();
            // Stale records may linger between sweeper runs; filter them
            // out of the response without rewriting the snapshot.
            records.retain(|r| !r.is_expired(now, self.expiry_seconds));
            records
        };

        let selected: Vec<_> = match station_id {
            Some(ref id) if !id.is_empty() => {
                records.into_iter().filter(|r| &r.id == id).collect()
            }
            _ => records,
        };

        match codec::encode_records(&selected) {
            Ok(body) => Reply::with_body(Status::Ok, body),
            Err(e) => {
                error!(error = %e, "failed to encode aggregate");
                Reply::empty(Status::InternalServerError)
            }
        }
    }

    async fn process_sweep(&mut self) {
        let now = Utc::now().timestamp();
        let expired = {
            let store = self.store.lock().await;
            let records = store.load();
            let (live, expired) = sweep::partition_expired(records, now, self.expiry_seconds);
            if expired.is_empty() {
                return;
            }
            if let Err(e) = store.save(&live) {
                warn!(error = %e, "sweep failed to persist reduced snapshot");
                return;
            }
            expired
        };

        // Expired stations start over: their next PUT is first-contact.
        for station in &expired {
            self.clocks.publishers.forget(station);
        }
        info!(stations = ?expired, "expired stations removed");
    }
}
