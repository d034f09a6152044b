//! Polling session
//!
//! One background task per stove. Each cycle connects if needed, fetches the
//! `info`, `data` and `data2` snapshots in that order, then drains the write
//! queue. Connection failures never reach the caller: the link is dropped,
//! the state goes to `Disconnected` and the cycle is retried after the retry
//! delay, until [`PollingSession::stop`] is called.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::Frame;
use crate::command::StoveCommand;
use crate::config::StoveConfig;
use crate::connection::{Connector, StoveConnection, TcpConnector};
use crate::constants::{DATA_BLOCK_PRIMARY, DATA_BLOCK_SECONDARY};
use crate::error::{Result, StoveError};
use crate::registers::{Data2Record, DataRecord, InfoRecord};
use crate::report::StoveReport;
use crate::types::{ConnectionState, SessionStatus, Snapshot, SnapshotKind};

// ============================================================================
// Shared State
// ============================================================================

#[derive(Debug, Default)]
struct CycleStats {
    last_poll: Option<DateTime<Utc>>,
    last_error: Option<String>,
    cycles: u64,
    failures: u64,
}

/// State shared between the handle and the poll task
struct Shared {
    state: watch::Sender<ConnectionState>,
    info: RwLock<Option<Arc<Snapshot>>>,
    data: RwLock<Option<Arc<Snapshot>>>,
    data2: RwLock<Option<Arc<Snapshot>>>,
    queue: Mutex<VecDeque<Vec<String>>>,
    /// Signalled whenever a queued write is delivered
    delivered: Notify,
    stats: Mutex<CycleStats>,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Stopped);
        Self {
            state,
            info: RwLock::new(None),
            data: RwLock::new(None),
            data2: RwLock::new(None),
            queue: Mutex::new(VecDeque::new()),
            delivered: Notify::new(),
            stats: Mutex::new(CycleStats::default()),
        }
    }

    fn slot(&self, kind: SnapshotKind) -> &RwLock<Option<Arc<Snapshot>>> {
        match kind {
            SnapshotKind::Info => &self.info,
            SnapshotKind::Data => &self.data,
            SnapshotKind::Data2 => &self.data2,
        }
    }

    fn store(&self, snapshot: Snapshot) {
        let kind = snapshot.kind();
        *self.slot(kind).write() = Some(Arc::new(snapshot));
    }

    fn load(&self, kind: SnapshotKind) -> Option<Arc<Snapshot>> {
        self.slot(kind).read().clone()
    }

    /// Record a state change; nothing leaves `Stopped` except `start`
    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next || *current == ConnectionState::Stopped {
                return false;
            }
            debug!("State: {} -> {}", current, next);
            *current = next;
            true
        });
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

// ============================================================================
// Polling Session
// ============================================================================

/// Handle to one stove's poll loop
///
/// Dropping the handle cancels the loop.
pub struct PollingSession {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    config: StoveConfig,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PollingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingSession")
            .field("target", &self.connector.target())
            .field("state", &self.shared.state())
            .finish()
    }
}

impl PollingSession {
    /// Session talking TCP to `config.host:config.port`
    pub fn new(config: StoveConfig) -> Self {
        let connector = TcpConnector::new(config.host.clone(), config.port, config.connect_timeout());
        Self::with_connector(config, Arc::new(connector))
    }

    /// Session over a custom stream source; `config` supplies the timing
    pub fn with_connector(config: StoveConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            connector,
            config,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Spawn the poll loop on the current tokio runtime
    ///
    /// Returns `false` if the loop is already running or the session was
    /// stopped; a stopped session cannot be restarted.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.is_some() || self.cancel.is_cancelled() {
            return false;
        }

        info!("Session start: {}", self.connector.target());
        self.shared.state.send_replace(ConnectionState::Disconnected);

        let worker = PollLoop {
            shared: Arc::clone(&self.shared),
            connector: Arc::clone(&self.connector),
            poll_interval: self.config.poll_interval(),
            retry_delay: self.config.retry_delay(),
            response_timeout: self.config.response_timeout(),
            cancel: self.cancel.clone(),
        };
        *task = Some(tokio::spawn(worker.run()));
        true
    }

    /// End the loop; idempotent
    ///
    /// The state is `Stopped` when this returns. Pending retry timers and
    /// response waits are abandoned; a frame already being written is
    /// finished first, then the socket is closed. Use
    /// [`stopped`](Self::stopped) to wait for the task to exit.
    pub fn stop(&self) {
        // Serialised with start()
        let _task = self.task.lock();
        if self.cancel.is_cancelled() {
            return;
        }
        info!("Session stop: {}", self.connector.target());
        self.cancel.cancel();
        self.shared.set_state(ConnectionState::Stopped);
    }

    /// Wait for the poll task to exit
    pub async fn stopped(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Poll task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ------------------------------------------------------------------------
    // Connection state
    // ------------------------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        self.shared.state().is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Receiver that observes every state change
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        let stats = self.shared.stats.lock();
        SessionStatus {
            state: self.shared.state(),
            pending_commands: self.pending_commands(),
            last_poll: stats.last_poll,
            last_error: stats.last_error.clone(),
            cycles: stats.cycles,
            failures: stats.failures,
        }
    }

    // ------------------------------------------------------------------------
    // Command queue
    // ------------------------------------------------------------------------

    /// Queue a raw write parameter list for the next cycle
    pub fn enqueue_command(&self, parameters: Vec<String>) {
        let mut queue = self.shared.queue.lock();
        queue.push_back(parameters);
        debug!("Queued write, {} pending", queue.len());
    }

    /// Validate and queue a typed command
    pub fn enqueue(&self, command: StoveCommand) -> Result<()> {
        command.validate()?;
        debug!("Queue: {}", command);
        self.enqueue_command(command.to_parameters());
        Ok(())
    }

    pub fn pending_commands(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Wait until the write queue is empty
    ///
    /// Fails with [`StoveError::Stopped`] if the session stops first.
    pub async fn drained(&self) -> Result<()> {
        loop {
            let delivered = self.shared.delivered.notified();
            if self.shared.queue.lock().is_empty() {
                return Ok(());
            }
            if self.cancel.is_cancelled() {
                return Err(StoveError::Stopped);
            }
            tokio::select! {
                _ = delivered => {},
                _ = self.cancel.cancelled() => return Err(StoveError::Stopped),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// Latest `INF` snapshot, `None` until one has been fetched
    pub fn info(&self) -> Option<Arc<Snapshot>> {
        self.shared.load(SnapshotKind::Info)
    }

    /// Latest `DAT 0` snapshot
    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.shared.load(SnapshotKind::Data)
    }

    /// Latest `DAT 2` snapshot
    pub fn data2(&self) -> Option<Arc<Snapshot>> {
        self.shared.load(SnapshotKind::Data2)
    }

    pub fn info_record(&self) -> Result<InfoRecord> {
        self.info()
            .map(|s| InfoRecord::decode(&s))
            .ok_or(StoveError::Disconnected)
    }

    pub fn data_record(&self) -> Result<DataRecord> {
        self.data()
            .map(|s| DataRecord::decode(&s))
            .ok_or(StoveError::Disconnected)
    }

    pub fn data2_record(&self) -> Result<Data2Record> {
        self.data2()
            .map(|s| Data2Record::decode(&s))
            .ok_or(StoveError::Disconnected)
    }

    /// Decode whatever is currently stored
    pub fn report(&self) -> StoveReport {
        StoveReport::from_snapshots(
            self.state(),
            self.info().as_deref(),
            self.data().as_deref(),
            self.data2().as_deref(),
        )
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Poll Loop
// ============================================================================

struct PollLoop {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    poll_interval: Duration,
    retry_delay: Duration,
    response_timeout: Duration,
    cancel: CancellationToken,
}

impl PollLoop {
    async fn run(self) {
        // Owned socket slot, replaced wholesale on reconnect
        let mut link: Option<StoveConnection> = None;

        loop {
            let Some(delay) = self.cycle(&mut link).await else {
                break;
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {},
            }
        }

        drop(link);
        self.shared.set_state(ConnectionState::Stopped);
        info!("Session stopped: {}", self.connector.target());
    }

    /// Run one cycle and return the delay before the next one, or `None`
    /// once the session is stopped
    async fn cycle(&self, link: &mut Option<StoveConnection>) -> Option<Duration> {
        match self.poll_once(link).await {
            Ok(()) => {
                let mut stats = self.shared.stats.lock();
                stats.cycles += 1;
                stats.last_poll = Some(Utc::now());
                Some(self.poll_interval)
            },
            Err(StoveError::Stopped) => None,
            Err(e) => {
                if e.needs_reconnect() {
                    *link = None;
                }
                warn!("Poll failed: {}, retry in {:?}", e, self.retry_delay);
                self.shared.set_state(ConnectionState::Disconnected);
                let mut stats = self.shared.stats.lock();
                stats.failures += 1;
                stats.last_error = Some(e.to_string());
                Some(self.retry_delay)
            },
        }
    }

    async fn poll_once(&self, link: &mut Option<StoveConnection>) -> Result<()> {
        if link.is_none() {
            self.shared.set_state(ConnectionState::Connecting);
            let conn = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(StoveError::Stopped),
                conn = StoveConnection::open(self.connector.as_ref()) => conn?,
            };
            *link = Some(conn);
            self.shared.set_state(ConnectionState::Connected);
            info!("Stove connected: {}", self.connector.target());
        }
        let Some(conn) = link.as_mut() else {
            return Err(StoveError::Disconnected);
        };

        self.fetch_snapshots(conn).await?;
        self.drain_queue(conn).await
    }

    async fn fetch_snapshots(&self, conn: &mut StoveConnection) -> Result<()> {
        let reads = [
            (SnapshotKind::Info, Frame::info()),
            (SnapshotKind::Data, Frame::read_block(DATA_BLOCK_PRIMARY)),
            (SnapshotKind::Data2, Frame::read_block(DATA_BLOCK_SECONDARY)),
        ];

        for (kind, frame) in reads {
            let fields = conn
                .exchange(&frame, self.response_timeout, &self.cancel)
                .await?;
            self.shared.store(Snapshot::new(kind, fields));
        }
        Ok(())
    }

    /// Deliver the entries queued when the drain began, oldest first
    async fn drain_queue(&self, conn: &mut StoveConnection) -> Result<()> {
        let pending = self.shared.queue.lock().len();

        for _ in 0..pending {
            let next = self.shared.queue.lock().front().cloned();
            let Some(parameters) = next else {
                break;
            };

            conn.exchange(&Frame::write(&parameters), self.response_timeout, &self.cancel)
                .await?;

            // Only this loop removes entries, so the front is still ours
            self.shared.queue.lock().pop_front();
            self.shared.delivered.notify_waiters();
            debug!("Write delivered: {}", parameters.join(";"));
        }
        Ok(())
    }
}
