//! Stove Driver Error Types
//!
//! Core error types for the stove protocol engine.

use std::time::Duration;
use thiserror::Error;

/// Result type for stove-protocol operations
pub type Result<T> = std::result::Result<T, StoveError>;

/// Stove driver errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoveError {
    /// Socket could not be established
    #[error("Connect failure: {0}")]
    ConnectFailure(String),

    /// No response line within the response timeout
    #[error("Exchange timed out after {0:?}")]
    ExchangeTimeout(Duration),

    /// Mid-exchange I/O failure, including the peer closing the socket
    #[error("Socket error: {0}")]
    SocketError(String),

    /// No snapshot has been fetched yet
    #[error("Disconnected: no data received from stove yet")]
    Disconnected,

    /// Malformed request frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Write command argument out of range
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session has been stopped
    #[error("Session stopped")]
    Stopped,
}

impl From<std::io::Error> for StoveError {
    fn from(err: std::io::Error) -> Self {
        StoveError::SocketError(err.to_string())
    }
}

impl From<figment::Error> for StoveError {
    fn from(err: figment::Error) -> Self {
        StoveError::Config(err.to_string())
    }
}

// Helper methods for creating errors
impl StoveError {
    pub fn connect(msg: impl Into<String>) -> Self {
        StoveError::ConnectFailure(msg.into())
    }

    pub fn socket(msg: impl Into<String>) -> Self {
        StoveError::SocketError(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        StoveError::Protocol(msg.into())
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        StoveError::InvalidCommand(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        StoveError::Config(msg.into())
    }

    /// Check if this error means the current socket must be dropped
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            StoveError::ConnectFailure(_)
                | StoveError::ExchangeTimeout(_)
                | StoveError::SocketError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_socket_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: StoveError = io.into();
        assert!(matches!(err, StoveError::SocketError(ref m) if m.contains("reset by peer")));
    }

    #[test]
    fn test_needs_reconnect() {
        assert!(StoveError::connect("refused").needs_reconnect());
        assert!(StoveError::ExchangeTimeout(Duration::from_secs(60)).needs_reconnect());
        assert!(StoveError::socket("closed").needs_reconnect());
        assert!(!StoveError::Disconnected.needs_reconnect());
        assert!(!StoveError::protocol("bad crc").needs_reconnect());
        assert!(!StoveError::invalid_command("power 9").needs_reconnect());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            StoveError::ExchangeTimeout(Duration::from_secs(60)).to_string(),
            "Exchange timed out after 60s"
        );
        assert_eq!(StoveError::Stopped.to_string(), "Session stopped");
    }
}
