//! Pellet-Stove WiFi Controller Protocol
//!
//! Driver for the line-oriented TCP protocol spoken by pellet-stove WiFi
//! modules (default port 5001).
//!
//! # Architecture
//!
//! - [`codec`] builds and checks request frames (`#00000C---…CRC\n`)
//! - [`accumulator`] turns socket bytes into `;`-split response lines
//! - [`connection`] is the socket boundary ([`Connector`], [`StoveConnection`])
//! - [`session`] runs the poll loop and owns the write queue
//! - [`registers`] and [`capabilities`] decode snapshots into typed values
//!
//! # Example
//!
//! ```no_run
//! use stove_protocol::{PollingSession, StoveCommand, StoveConfig};
//!
//! # async fn demo() -> stove_protocol::Result<()> {
//! let session = PollingSession::new(StoveConfig::for_host("192.168.1.40"));
//! session.start();
//! session.enqueue(StoveCommand::SetPower { level: 3 })?;
//! session.drained().await?;
//! println!("{:?}", session.data_record()?.state);
//! session.stop();
//! session.stopped().await;
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod capabilities;
pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
pub mod constants;
pub mod error;
pub mod registers;
pub mod report;
pub mod session;
pub mod types;

pub use accumulator::ResponseAccumulator;
pub use capabilities::Capabilities;
pub use codec::{Command, Frame, Mode};
pub use command::StoveCommand;
pub use config::StoveConfig;
pub use connection::{Connector, StoveConnection, StoveStream, TcpConnector};
pub use error::{Result, StoveError};
pub use registers::{Action, Data2Record, DataRecord, InfoRecord, RoomReading, StoveState};
pub use report::StoveReport;
pub use session::PollingSession;
pub use types::{ConnectionState, SessionStatus, Snapshot, SnapshotKind};
