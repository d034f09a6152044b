//! Shared session types: connection state, snapshots, status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Connection State
// ============================================================================

/// Connection state of a polling session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    /// Not running; terminal once a session has been stopped
    #[default]
    Stopped,
    /// Waiting out the retry delay
    Disconnected,
    /// TCP handshake in progress
    Connecting,
    /// Socket established
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Stopped => write!(f, "STOPPED"),
            ConnectionState::Disconnected => write!(f, "DISCONNECTED"),
            ConnectionState::Connecting => write!(f, "CONNECTING"),
            ConnectionState::Connected => write!(f, "CONNECTED"),
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Which of the three status blocks a snapshot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// `INF` response
    Info,
    /// `DAT 0` response
    Data,
    /// `DAT 2` response
    Data2,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Info => write!(f, "info"),
            SnapshotKind::Data => write!(f, "data"),
            SnapshotKind::Data2 => write!(f, "data2"),
        }
    }
}

/// Positional field array from one successful read exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    kind: SnapshotKind,
    fields: Vec<String>,
    received_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(kind: SnapshotKind, fields: Vec<String>) -> Self {
        Self {
            kind,
            fields,
            received_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Raw field at `index`, `None` when the response was shorter
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

// ============================================================================
// Session Status
// ============================================================================

/// Point-in-time view of a polling session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: ConnectionState,
    pub pending_commands: usize,
    /// Completion time of the last fully successful cycle
    pub last_poll: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cycles: u64,
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_default_is_stopped() {
        assert_eq!(ConnectionState::default(), ConnectionState::Stopped);
        assert!(!ConnectionState::default().is_connected());
        assert!(ConnectionState::Connected.is_connected());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "CONNECTING");
        assert_eq!(ConnectionState::Disconnected.to_string(), "DISCONNECTED");
    }

    #[test]
    fn test_snapshot_field_access() {
        let snap = Snapshot::new(
            SnapshotKind::Data,
            vec!["DAT".to_string(), "215".to_string()],
        );
        assert_eq!(snap.kind(), SnapshotKind::Data);
        assert_eq!(snap.field(1), Some("215"));
        assert_eq!(snap.field(9), None);
        assert_eq!(snap.len(), 2);
        assert!(!snap.is_empty());
    }

    #[test]
    fn test_empty_snapshot_is_not_absent() {
        let snap = Snapshot::new(SnapshotKind::Info, Vec::new());
        assert!(snap.is_empty());
        assert_eq!(snap.field(0), None);
    }
}
