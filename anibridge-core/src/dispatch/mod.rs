//! The change-event dispatcher.
//!
//! Catalog notifications arrive over a bounded intake channel and are folded
//! into per-key buffering tables (key = file id or metadata provider uid).
//! A fixed-interval tick flushes every key whose newest event is older than
//! the settle threshold; each settled batch is handed to its own task so a
//! slow remote call in one batch never delays the others. While a library
//! scan runs, settled keys stay buffered; the scan gate's release flushes
//! them in one go.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use anibridge_config::{DispatchConfig, LibraryFolder};
use anibridge_model::FileId;

use crate::client::CatalogClient;
use crate::error::{BridgeError, Result};
use crate::host::HostLibrary;
use crate::resolver::MetadataResolver;
use crate::vfs::LinkGenerator;

mod events;
mod file_batch;
mod metadata_batch;
mod scan_gate;

pub use events::{ChangeEvent, ChangeReason, FileEvent, MetadataEvent, MetadataScope};
pub use scan_gate::ScanGate;

struct PendingBatch<T> {
    last_updated: Instant,
    events: Vec<T>,
}

impl<T> PendingBatch<T> {
    fn new(event: T) -> Self {
        Self {
            last_updated: Instant::now(),
            events: vec![event],
        }
    }

    fn push(&mut self, event: T) {
        self.last_updated = Instant::now();
        self.events.push(event);
    }

    fn settled(&self, now: Instant, threshold: Duration) -> bool {
        now.duration_since(self.last_updated) >= threshold
    }
}

pub(crate) struct DispatcherInner {
    pub config: DispatchConfig,
    pub resolver: Arc<MetadataResolver>,
    pub client: Arc<dyn CatalogClient>,
    pub linker: Arc<dyn LinkGenerator>,
    pub host: Arc<dyn HostLibrary>,
    pub folders: Vec<LibraryFolder>,
    pub scan_gate: ScanGate,
    /// Cancellation threaded from shutdown into long host refresh calls.
    pub cancel: CancellationToken,
    pending_files: Mutex<HashMap<FileId, PendingBatch<FileEvent>>>,
    pending_metadata: Mutex<HashMap<String, PendingBatch<MetadataEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DispatcherInner {
    fn buffer(&self, event: ChangeEvent) {
        match event {
            ChangeEvent::File(event) => {
                let mut pending = self.pending_files.lock().expect("file table poisoned");
                match pending.get_mut(&event.file_id) {
                    Some(batch) => batch.push(event),
                    None => {
                        debug!(file_id = %event.file_id, reason = ?event.reason, "buffering file events");
                        pending.insert(event.file_id, PendingBatch::new(event));
                    }
                }
            }
            ChangeEvent::Metadata(event) => {
                let mut pending = self
                    .pending_metadata
                    .lock()
                    .expect("metadata table poisoned");
                match pending.get_mut(&event.provider_uid) {
                    Some(batch) => batch.push(event),
                    None => {
                        debug!(
                            uid = %event.provider_uid,
                            reason = ?event.reason,
                            "buffering metadata events"
                        );
                        pending.insert(event.provider_uid.clone(), PendingBatch::new(event));
                    }
                }
            }
        }
    }

    /// Move every settled key out of the buffering tables and hand each
    /// batch to its own task.
    fn flush_settled(self: &Arc<Self>) {
        let threshold = Duration::from_millis(self.config.settle_threshold_ms);
        let now = Instant::now();

        let files: Vec<(FileId, Vec<FileEvent>)> = {
            let mut pending = self.pending_files.lock().expect("file table poisoned");
            let keys: Vec<FileId> = pending
                .iter()
                .filter(|(_, batch)| batch.settled(now, threshold))
                .map(|(id, _)| *id)
                .collect();
            keys.into_iter()
                .filter_map(|id| pending.remove(&id).map(|batch| (id, batch.events)))
                .collect()
        };
        let metadata: Vec<(String, Vec<MetadataEvent>)> = {
            let mut pending = self
                .pending_metadata
                .lock()
                .expect("metadata table poisoned");
            let keys: Vec<String> = pending
                .iter()
                .filter(|(_, batch)| batch.settled(now, threshold))
                .map(|(key, _)| key.clone())
                .collect();
            keys.into_iter()
                .filter_map(|key| pending.remove(&key).map(|batch| (key, batch.events)))
                .collect()
        };

        self.spawn_batches(files, metadata);
    }

    /// Teardown flush: drain every buffered key regardless of settle age.
    fn flush_all(self: &Arc<Self>) {
        let files: Vec<(FileId, Vec<FileEvent>)> = self
            .pending_files
            .lock()
            .expect("file table poisoned")
            .drain()
            .map(|(id, batch)| (id, batch.events))
            .collect();
        let metadata: Vec<(String, Vec<MetadataEvent>)> = self
            .pending_metadata
            .lock()
            .expect("metadata table poisoned")
            .drain()
            .map(|(key, batch)| (key, batch.events))
            .collect();
        self.spawn_batches(files, metadata);
    }

    fn spawn_batches(
        self: &Arc<Self>,
        files: Vec<(FileId, Vec<FileEvent>)>,
        metadata: Vec<(String, Vec<MetadataEvent>)>,
    ) {
        for (file_id, events) in files {
            let inner = Arc::clone(self);
            self.track(tokio::spawn(async move {
                let count = events.len();
                if let Err(err) = file_batch::process(&inner, file_id, events).await {
                    // No retry: the next change or a manual resync heals it.
                    error!(
                        file_id = %file_id,
                        event_count = count,
                        error = %err,
                        "error processing file change events"
                    );
                }
            }));
        }
        for (key, events) in metadata {
            let inner = Arc::clone(self);
            self.track(tokio::spawn(async move {
                let count = events.len();
                if let Err(err) = metadata_batch::process(&inner, &key, events).await {
                    error!(
                        uid = %key,
                        event_count = count,
                        error = %err,
                        "error processing metadata change events"
                    );
                }
            }));
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut workers = self.workers.lock().expect("worker list poisoned");
        workers.retain(|worker| !worker.is_finished());
        workers.push(handle);
    }
}

impl std::fmt::Debug for DispatcherInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherInner")
            .field("config", &self.config)
            .field("folder_count", &self.folders.len())
            .finish_non_exhaustive()
    }
}

/// Coalesces catalog change notifications and drives synchronization.
#[derive(Debug)]
pub struct EventDispatcher {
    inner: Arc<DispatcherInner>,
    intake: mpsc::Sender<ChangeEvent>,
    stop: CancellationToken,
    pump: JoinHandle<()>,
    driver: JoinHandle<()>,
}

impl EventDispatcher {
    /// Start the dispatcher's pump and settle-timer tasks.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        config: DispatchConfig,
        folders: Vec<LibraryFolder>,
        resolver: Arc<MetadataResolver>,
        client: Arc<dyn CatalogClient>,
        linker: Arc<dyn LinkGenerator>,
        host: Arc<dyn HostLibrary>,
        scan_gate: ScanGate,
    ) -> Self {
        let (intake, mut intake_rx) = mpsc::channel::<ChangeEvent>(config.intake_capacity.max(1));
        let stop = CancellationToken::new();
        let cancel = CancellationToken::new();

        let inner = Arc::new(DispatcherInner {
            config,
            resolver,
            client,
            linker,
            host,
            folders,
            scan_gate,
            cancel,
            pending_files: Mutex::new(HashMap::new()),
            pending_metadata: Mutex::new(HashMap::new()),
            workers: Mutex::new(Vec::new()),
        });

        let pump = {
            let inner = Arc::clone(&inner);
            let stop = stop.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        event = intake_rx.recv() => match event {
                            Some(event) => inner.buffer(event),
                            None => break,
                        },
                    }
                }
            })
        };

        let driver = {
            let inner = Arc::clone(&inner);
            let stop = stop.clone();
            let mut scan_rx = inner.scan_gate.subscribe();
            tokio::spawn(async move {
                let mut tick =
                    tokio::time::interval(Duration::from_millis(inner.config.tick_interval_ms));
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = tick.tick() => {
                            if !inner.scan_gate.is_scanning() {
                                inner.flush_settled();
                            }
                        }
                        changed = scan_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            if !*scan_rx.borrow_and_update() {
                                inner.flush_settled();
                            }
                        }
                    }
                }
            })
        };

        Self {
            inner,
            intake,
            stop,
            pump,
            driver,
        }
    }

    /// Enqueue a file change notification. Applies backpressure when the
    /// intake channel is full.
    pub async fn on_file_event(&self, event: FileEvent) -> Result<()> {
        self.intake
            .send(ChangeEvent::File(event))
            .await
            .map_err(|_| BridgeError::Internal("dispatcher intake closed".to_string()))
    }

    /// Enqueue a metadata change notification.
    pub async fn on_metadata_event(&self, event: MetadataEvent) -> Result<()> {
        self.intake
            .send(ChangeEvent::Metadata(event))
            .await
            .map_err(|_| BridgeError::Internal("dispatcher intake closed".to_string()))
    }

    pub fn scan_gate(&self) -> &ScanGate {
        &self.inner.scan_gate
    }

    /// Stop intake, force-flush every buffered key, and wait for in-flight
    /// batches. Long host refreshes observe the cancellation token and stop
    /// instead of retrying.
    pub async fn shutdown(self) {
        self.stop.cancel();
        let _ = self.pump.await;
        let _ = self.driver.await;

        self.inner.flush_all();
        self.inner.cancel.cancel();

        let workers: Vec<JoinHandle<()>> = {
            let mut guard = self.inner.workers.lock().expect("worker list poisoned");
            guard.drain(..).collect()
        };
        for worker in workers {
            let _ = worker.await;
        }
        info!("event dispatcher stopped");
    }
}
