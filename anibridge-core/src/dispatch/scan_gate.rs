use tokio::sync::watch;

/// Shared "a full library scan is running" flag.
///
/// Batch workers read it before emitting host notifications; the dispatcher
/// watches the true-to-false transition to flush edits deferred while the
/// scan ran. A scan observes filesystem state itself, so notifying the host
/// mid-scan would race it.
#[derive(Debug, Clone)]
pub struct ScanGate {
    state: watch::Sender<bool>,
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    pub fn set_scanning(&self, active: bool) {
        self.state.send_replace(active);
    }

    pub fn is_scanning(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
