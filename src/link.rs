use std::{future::Future, sync::Arc};
use thiserror::Error;

use crate::PollSnapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot transport failed: {0}")]
    Transport(String),
    #[error("Snapshot could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Cannot send command: Not connected to INDI server.")]
    NotConnected,
    #[error("Cannot send command: No command provided.")]
    EmptyCommand,
    #[error("Failed to send command: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Error: IP address was not provided.")]
    MissingHost,
    #[error("Connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Link error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    AlreadyConnected,
}

impl LinkStatus {
    pub fn message(&self, host: &str) -> String {
        match self {
            LinkStatus::Connected => format!("Successfully connected to {}", host),
            LinkStatus::AlreadyConnected => {
                "Already connected or socket already created; try refreshing if you have an issue"
                    .to_owned()
            }
        }
    }
}

/// One-shot pull of the complete remote tree.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch_snapshot(
        &self,
    ) -> impl Future<Output = Result<PollSnapshot, SnapshotError>> + Send;
}

impl<T: SnapshotSource> SnapshotSource for Arc<T> {
    fn fetch_snapshot(
        &self,
    ) -> impl Future<Output = Result<PollSnapshot, SnapshotError>> + Send {
        (**self).fetch_snapshot()
    }
}

/// Transmits opaque protocol payloads upstream. Payloads are never inspected.
pub trait CommandChannel {
    fn send_command(
        &self,
        payload: &str,
    ) -> impl Future<Output = Result<(), CommandError>> + Send;
}

pub trait UpstreamLink {
    fn connect(&self, host: &str) -> impl Future<Output = Result<LinkStatus, LinkError>> + Send;

    fn disconnect(&self) -> impl Future<Output = Result<(), LinkError>> + Send;
}
