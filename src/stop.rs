use tokio::sync::watch;

/// Single-shot advisory cancellation scoped to one connect call.
///
/// Firing is idempotent and irrevocable. The signal fires on drop as well,
/// so every return path of the owner stops its listeners.
#[derive(Debug)]
pub(crate) struct StopSignal {
    tx: watch::Sender<bool>,
}

/// Receiving side of a [`StopSignal`], one per strategy task.
#[derive(Debug, Clone)]
pub(crate) struct StopListener {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub(crate) fn listener(&self) -> StopListener {
        StopListener { rx: self.tx.subscribe() }
    }

    pub(crate) fn stop(&self) {
        self.tx.send_if_modified(|stopped| !std::mem::replace(stopped, true));
    }
}

impl Drop for StopSignal {
    fn drop(&mut self) {
        self.stop();
    }
}

impl StopListener {
    pub(crate) fn is_stopped(&self) -> bool {
        let stopped = *self.rx.borrow();
        // dropped sender means the owner has gone
        stopped || self.rx.has_changed().is_err()
    }

    /// Resolves as soon as the signal fires.
    pub(crate) async fn stopped(&mut self) {
        // error means the sender is dropped, which is a stop too
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
