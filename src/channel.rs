use std::time::Duration;
use tokio::sync::mpsc;

use crate::{PollResult, PollSnapshot, SnapshotError, SnapshotPoller, SnapshotSource};

/// Which delivery mechanism currently acts as the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Incremental push events only.
    Push,
    /// A polling timer is active; its snapshots win for every field they carry.
    Poll,
}

#[derive(Debug)]
pub enum PollDisposition {
    Apply(PollSnapshot),
    LinkDown,
    Failed(SnapshotError),
}

/// Coordinates the pull side: the polling timer, the snapshot source and the
/// channel poll results are delivered on. Push events reach the session
/// directly and need no coordination beyond their delivery order.
pub struct ChannelAdapter<S> {
    source: S,
    poller: SnapshotPoller,
    poll_tx: mpsc::Sender<PollResult>,
    interval: Duration,
}

impl<S> ChannelAdapter<S>
where
    S: SnapshotSource + Clone,
{
    pub fn new(
        source: S,
        interval: Duration,
        channel_size: usize,
    ) -> (Self, mpsc::Receiver<PollResult>) {
        let (poll_tx, poll_rx) = mpsc::channel(channel_size.max(1));
        (
            Self {
                source,
                poller: SnapshotPoller::new(),
                poll_tx,
                interval,
            },
            poll_rx,
        )
    }

    pub fn mode(&self) -> ChannelMode {
        if self.poller.is_active() {
            ChannelMode::Poll
        } else {
            ChannelMode::Push
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// No-op returning false while a timer is already active.
    pub fn start_polling(&mut self) -> bool {
        self.poller
            .start(self.source.clone(), self.poll_tx.clone(), self.interval)
    }

    pub fn stop_polling(&mut self) -> bool {
        self.poller.stop()
    }

    /// A single pull outside the timer.
    pub async fn poll_once(&self) -> PollResult {
        PollResult::from(self.source.fetch_snapshot().await)
    }

    /// Decides what to do with a poll result. A dead link or failed pull stops
    /// the timer before anything else happens.
    pub fn classify(&mut self, result: PollResult) -> PollDisposition {
        match result {
            PollResult::Snapshot(snapshot) if snapshot.is_connected => {
                PollDisposition::Apply(snapshot)
            }
            PollResult::Snapshot(_) => {
                self.poller.stop();
                PollDisposition::LinkDown
            }
            PollResult::Failed(err) => {
                self.poller.stop();
                PollDisposition::Failed(err)
            }
        }
    }
}
