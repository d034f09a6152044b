//! Decoded view over the stored snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::capabilities::Capabilities;
use crate::registers::{Data2Record, DataRecord, InfoRecord};
use crate::types::{ConnectionState, Snapshot};

/// Everything the session currently knows about the stove
///
/// Blocks that were never fetched are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoveReport {
    pub connection: ConnectionState,
    pub info: Option<InfoRecord>,
    pub data: Option<DataRecord>,
    pub data2: Option<Data2Record>,
    pub capabilities: Option<Capabilities>,
    /// Receive time of the newest snapshot
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoveReport {
    pub fn from_snapshots(
        connection: ConnectionState,
        info: Option<&Snapshot>,
        data: Option<&Snapshot>,
        data2: Option<&Snapshot>,
    ) -> Self {
        let data_record = data.map(DataRecord::decode);
        let capabilities = data_record.as_ref().and_then(DataRecord::capabilities);
        let updated_at = [info, data, data2]
            .into_iter()
            .flatten()
            .map(Snapshot::received_at)
            .max();

        Self {
            connection,
            info: info.map(InfoRecord::decode),
            data: data_record,
            data2: data2.map(Data2Record::decode),
            capabilities,
            updated_at,
        }
    }

    /// `true` once all three blocks have been fetched
    pub fn is_complete(&self) -> bool {
        self.info.is_some() && self.data.is_some() && self.data2.is_some()
    }
}
