use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => f.write_str("Connected"),
            ConnectionState::Disconnected => f.write_str("Disconnected"),
        }
    }
}

pub enum LifecycleUpdate {
    Changed {
        from: ConnectionState,
        to: ConnectionState,
    },
    NoChange,
}

/// Tracks whether the upstream device link is up. Starts disconnected.
#[derive(Debug, Clone)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
    since: DateTime<Utc>,
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            since: Utc::now(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// When the current state was entered.
    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    pub fn mark_connected(&mut self) -> LifecycleUpdate {
        self.transition(ConnectionState::Connected)
    }

    pub fn mark_disconnected(&mut self) -> LifecycleUpdate {
        self.transition(ConnectionState::Disconnected)
    }

    fn transition(&mut self, to: ConnectionState) -> LifecycleUpdate {
        if self.state == to {
            return LifecycleUpdate::NoChange;
        }
        let from = self.state;
        self.state = to;
        self.since = Utc::now();
        log::info!("INDI link {} -> {}", from, to);
        LifecycleUpdate::Changed { from, to }
    }
}
