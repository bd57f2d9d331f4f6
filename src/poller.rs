use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{PollSnapshot, SnapshotError, SnapshotSource};

#[derive(Debug)]
pub enum PollResult {
    Snapshot(PollSnapshot),
    Failed(SnapshotError),
}

impl PollResult {
    /// False once the pull itself failed or reported the device link as down.
    pub fn link_alive(&self) -> bool {
        matches!(self, PollResult::Snapshot(s) if s.is_connected)
    }
}

impl From<Result<PollSnapshot, SnapshotError>> for PollResult {
    fn from(value: Result<PollSnapshot, SnapshotError>) -> Self {
        match value {
            Ok(snapshot) => PollResult::Snapshot(snapshot),
            Err(err) => PollResult::Failed(err),
        }
    }
}

/// Owns at most one periodic snapshot timer.
///
/// Stopping cancels the timer right away but lets a pull that is already in
/// flight finish; its result is still delivered, the timer is not rearmed.
#[derive(Default, Debug)]
pub struct SnapshotPoller {
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl SnapshotPoller {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel: None,
        }
    }

    /// Starts polling every `interval`, first pull one interval from now.
    /// Returns false (and does nothing) if a timer is already active.
    pub fn start<S>(&mut self, source: S, sender: mpsc::Sender<PollResult>, interval: Duration) -> bool
    where
        S: SnapshotSource + Clone,
    {
        if self.is_active() {
            return false;
        }
        let token = CancellationToken::new();
        let cancel = token.clone();
        self.handle = Some(tokio::task::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let result = PollResult::from(source.fetch_snapshot().await);
                let link_alive = result.link_alive();
                if let Err(err) = sender.send(result).await {
                    log::warn!("Error delivering poll result: {}", err);
                    break;
                }
                if !link_alive {
                    log::debug!("Upstream link is down, polling stops itself");
                    cancel.cancel();
                    break;
                }
            }
            log::trace!("Snapshot poller exited");
        }));
        self.cancel = Some(token);
        log::debug!("Polling started ({:?} interval)", interval);
        true
    }

    /// Return true if a timer was stopped, false if none was running
    pub fn stop(&mut self) -> bool {
        let was_active = self.is_active();
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        // the task is not aborted so an in-flight pull still gets delivered
        self.handle.take();
        if was_active {
            log::debug!("Polling stopped");
        }
        was_active
    }

    pub fn is_active(&self) -> bool {
        let armed = self
            .cancel
            .as_ref()
            .map(|c| !c.is_cancelled())
            .unwrap_or(false);
        armed && self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl Drop for SnapshotPoller {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}
