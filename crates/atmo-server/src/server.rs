//! Connection acceptor, per-connection dispatch, and server lifecycle

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use atmo_proto::{read_request, write_response, HttpRequest, ProtoError, Status};
use atmo_store::SnapshotStore;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch, Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::pipeline::{Pipeline, PipelineHandle, Reply, WorkItem};
use crate::settings::Settings;
use crate::sweep;

/// How long shutdown waits for in-flight handlers before cancelling them.
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

const OVERLOAD_BODY: &[u8] = b"Server is overloaded, try again later.";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bind failed on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// A bound but not yet running aggregation server.
///
/// `bind` completes only after the listening socket exists, so callers can
/// read [`local_addr`](Self::local_addr) and connect as soon as
/// [`spawn`](Self::spawn) returns.
pub struct Aggregator {
    listener: TcpListener,
    local_addr: SocketAddr,
    settings: Settings,
}

impl Aggregator {
    pub async fn bind(settings: Settings) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", settings.port))
            .await
            .map_err(|source| ServerError::Bind {
                port: settings.port,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            port: settings.port,
            source,
        })?;
        Ok(Self {
            listener,
            local_addr,
            settings,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the pipeline worker, the sweeper, and the accept loop.
    pub fn spawn(self) -> AggregatorHandle {
        let store = Arc::new(Mutex::new(SnapshotStore::open(&self.settings.data_path)));

        let pipeline = Pipeline::start(
            store.clone(),
            self.settings.expiry_seconds,
            self.settings.queue_capacity,
        );
        let sweeper = tokio::spawn(sweep::run_sweeper(
            pipeline.handle(),
            self.settings.sweep_period,
        ));

        let (stop_tx, stop_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel();
        let permits = Arc::new(Semaphore::new(self.settings.pool_size));
        let accept_task = tokio::spawn(accept_loop(
            self.listener,
            pipeline.handle(),
            permits,
            stop_rx,
            ready_tx,
        ));

        AggregatorHandle {
            local_addr: self.local_addr,
            store,
            pipeline,
            sweeper,
            stop_tx,
            ready_rx: Some(ready_rx),
            accept_task,
        }
    }
}

/// Handle to a running server: readiness, address, and ordered shutdown.
pub struct AggregatorHandle {
    local_addr: SocketAddr,
    store: Arc<Mutex<SnapshotStore>>,
    pipeline: Pipeline,
    sweeper: JoinHandle<()>,
    stop_tx: watch::Sender<bool>,
    ready_rx: Option<oneshot::Receiver<()>>,
    accept_task: JoinHandle<()>,
}

impl AggregatorHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait until the accept loop is live. Completes immediately on every
    /// call after the first.
    pub async fn ready(&mut self) {
        if let Some(rx) = self.ready_rx.take() {
            let _ = rx.await;
        }
    }

    /// Ordered shutdown: stop accepting, close the listener, drain the
    /// handler pool with a deadline, stop the sweeper, empty the FIFO and
    /// clear the clock ledgers, purge the snapshot.
    pub async fn shutdown(self) {
        info!("shutting down aggregation server");

        let _ = self.stop_tx.send(true);
        if let Err(e) = self.accept_task.await {
            error!(error = %e, "acceptor task failed during shutdown");
        }

        self.sweeper.abort();
        let _ = self.sweeper.await;

        self.pipeline.stop().await;

        self.store.lock().await.purge();
        info!("aggregation server stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    pipeline: PipelineHandle,
    permits: Arc<Semaphore>,
    mut stop_rx: watch::Receiver<bool>,
    ready_tx: oneshot::Sender<()>,
) {
    let _ = ready_tx.send(());
    let mut handlers = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    handlers.spawn(handle_connection(
                        stream,
                        peer,
                        pipeline.clone(),
                        permits.clone(),
                    ));
                }
                Err(e) => {
                    error!(error = %e, "error accepting connection");
                }
            },
            // reap finished handlers so the set stays small
            Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
            _ = stop_rx.changed() => break,
        }
    }

    // Closing the listener unblocks any client still connecting.
    drop(listener);

    let deadline = tokio::time::Instant::now() + DRAIN_DEADLINE;
    loop {
        match tokio::time::timeout_at(deadline, handlers.join_next()).await {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_) => {
                warn!(
                    remaining = handlers.len(),
                    "drain deadline reached, cancelling handlers"
                );
                handlers.abort_all();
                while handlers.join_next().await.is_some() {}
                break;
            }
        }
    }
    info!("acceptor stopped");
}

/// One connection: parse, dispatch, respond, close.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    pipeline: PipelineHandle,
    permits: Arc<Semaphore>,
) {
    // Bounded pool: the connection waits here for a free handler slot.
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return,
    };

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let request = match read_request(&mut reader).await {
        Ok(request) => request,
        Err(ProtoError::MalformedRequestLine(line)) => {
            debug!(peer = %peer, line = %line, "malformed request line");
            if let Err(e) = write_response(&mut write_half, Status::BadRequest, b"").await {
                error!(peer = %peer, error = %e, "failed to write response");
            }
            return;
        }
        Err(ProtoError::ConnectionClosed) => return,
        Err(e) => {
            error!(peer = %peer, error = %e, "connection handling error");
            return;
        }
    };

    let reply = dispatch(request, peer, &pipeline).await;
    if let Err(e) = write_response(&mut write_half, reply.status, &reply.body).await {
        error!(peer = %peer, error = %e, "failed to write response");
    }
}

async fn dispatch(request: HttpRequest, peer: SocketAddr, pipeline: &PipelineHandle) -> Reply {
    let clock = request.lamport_clock();
    match request.method.as_str() {
        "PUT" => {
            if request.body.is_empty() {
                return Reply::empty(Status::NoContent);
            }
            let (tx, rx) = oneshot::channel();
            let item = WorkItem::Put {
                payload: request.body,
                clock,
                reply: tx,
            };
            await_worker(pipeline, item, rx).await
        }
        "GET" => {
            let (tx, rx) = oneshot::channel();
            let item = WorkItem::Get {
                peer: peer.to_string(),
                station_id: request.station_id(),
                clock,
                reply: tx,
            };
            await_worker(pipeline, item, rx).await
        }
        _ => Reply::empty(Status::BadRequest),
    }
}

async fn await_worker(
    pipeline: &PipelineHandle,
    item: WorkItem,
    rx: oneshot::Receiver<Reply>,
) -> Reply {
    if pipeline.try_submit(item).is_err() {
        return Reply::with_body(Status::ServiceUnavailable, OVERLOAD_BODY.to_vec());
    }
    match rx.await {
        Ok(reply) => reply,
        Err(_) => Reply::empty(Status::InternalServerError),
    }
}
