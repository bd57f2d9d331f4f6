use serde::Serialize;

use crate::{ConnectionState, JobPhase, TreeChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Success,
    Error,
}

/// A user visible message, e.g. the outcome of a command or connect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SinkUpdate {
    Tree(TreeChange),
    Phase(JobPhase),
    Connection(ConnectionState),
    /// Whether live refresh (polling) is running.
    Polling(bool),
    Status(StatusMessage),
}

/// Passive observer of everything a session wants to show.
pub trait PresentationSink {
    fn publish(&mut self, update: SinkUpdate);
}

impl PresentationSink for Vec<SinkUpdate> {
    fn publish(&mut self, update: SinkUpdate) {
        self.push(update);
    }
}

#[cfg(feature = "tokio")]
impl PresentationSink for tokio::sync::mpsc::UnboundedSender<SinkUpdate> {
    fn publish(&mut self, update: SinkUpdate) {
        if let Err(err) = self.send(update) {
            log::warn!("Presentation sink is gone, dropping update: {:?}", err.0);
        }
    }
}
