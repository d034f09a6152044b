//! Register decoding for the three status snapshots
//!
//! Each register is a fixed position in one snapshot. Values are either passed
//! through as text, parsed as integers, or parsed as integers in tenths and
//! scaled to one decimal (all temperatures).
//!
//! # Register map
//!
//! ```text
//! info (INF)          data (DAT 0)             data2 (DAT 2)
//!  0 header            0 header                 0 header
//!  1 manufacturer      1 stove type bitfield    1 flow switch
//!  2 product           2 stove state            2 generic pump
//!  3 firmware          3 alarm code             3-5 air exchange 1..3
//!  4 wifi firmware     4 power setpoint         6 buffer temperature
//!  5 wifi MAC          5 actual power           7 buffer setpoint
//!  6 serial number     6/8/10 room temperature  8 boiler temperature
//!                      7/9/11 room setpoint     9 boiler setpoint
//!                     12 exhaust temperature   10 DHW temperature
//!                     13-15 fan 1..3 speed     11 DHW setpoint
//!                     16 eco mode              12 boiler pump
//!                     17 chrono mode           13 DHW pump
//!                     18 pellet level
//!                     19 power switch
//! ```

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::trace;

use crate::capabilities::Capabilities;
use crate::types::Snapshot;

// ============================================================================
// Register Positions
// ============================================================================

pub mod info {
    pub const MANUFACTURER: usize = 1;
    pub const PRODUCT: usize = 2;
    pub const FIRMWARE_VERSION: usize = 3;
    pub const WIFI_VERSION: usize = 4;
    pub const WIFI_MAC: usize = 5;
    pub const SERIAL_NUMBER: usize = 6;
}

pub mod data {
    pub const STOVE_TYPE: usize = 1;
    pub const STOVE_STATE: usize = 2;
    pub const ALARM_CODE: usize = 3;
    pub const POWER_SETPOINT: usize = 4;
    pub const POWER_ACTUAL: usize = 5;
    /// (temperature, setpoint) per room, rooms 1..=3
    pub const ROOMS: [(usize, usize); 3] = [(6, 7), (8, 9), (10, 11)];
    pub const EXHAUST_TEMPERATURE: usize = 12;
    /// Fans 1..=3
    pub const FANS: [usize; 3] = [13, 14, 15];
    pub const ECO_MODE: usize = 16;
    pub const CHRONO_MODE: usize = 17;
    pub const PELLET_LEVEL: usize = 18;
    pub const POWER_SWITCH: usize = 19;
}

pub mod data2 {
    pub const FLOW_SWITCH: usize = 1;
    pub const GENERIC_PUMP: usize = 2;
    /// Air-exchange zones 1..=3
    pub const AIR_EXCHANGE: [usize; 3] = [3, 4, 5];
    pub const BUFFER_TEMPERATURE: usize = 6;
    pub const BUFFER_SETPOINT: usize = 7;
    pub const BOILER_TEMPERATURE: usize = 8;
    pub const BOILER_SETPOINT: usize = 9;
    pub const DHW_TEMPERATURE: usize = 10;
    pub const DHW_SETPOINT: usize = 11;
    pub const BOILER_PUMP: usize = 12;
    pub const DHW_PUMP: usize = 13;
}

// ============================================================================
// Field Transforms
// ============================================================================

/// Pass-through string
pub fn text(snapshot: &Snapshot, index: usize) -> Option<String> {
    snapshot.field(index).map(str::to_string)
}

/// Integer parse
pub fn integer(snapshot: &Snapshot, index: usize) -> Option<i64> {
    snapshot.field(index)?.trim().parse().ok()
}

/// Integer parse divided by ten (tenths of a degree)
pub fn tenths(snapshot: &Snapshot, index: usize) -> Option<f64> {
    integer(snapshot, index).map(|raw| raw as f64 / 10.0)
}

/// Non-zero integer as `true`
pub fn flag(snapshot: &Snapshot, index: usize) -> Option<bool> {
    integer(snapshot, index).map(|raw| raw != 0)
}

// ============================================================================
// Stove State
// ============================================================================

/// Lifecycle state reported in the `data` block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoveState {
    Off,
    /// Starting sub-phase 1..=7
    Starting(u8),
    Running,
    /// Stopping sub-phase 1..=2
    Stopping(u8),
    /// Eco-stop sub-phase 1..=3
    EcoStop(u8),
    LowPellet,
    EndPellet,
    BlackOut,
    IgnitionFailed,
    AntiFreeze,
    CoverOpen,
    NoPellet,
    Alarm,
    /// Code outside the table, kept verbatim
    Unknown(String),
}

/// Numeric code → state, in firmware order
const STATE_TABLE: [(i64, StoveState); 22] = [
    (0, StoveState::Off),
    (1, StoveState::Starting(1)),
    (2, StoveState::Starting(2)),
    (3, StoveState::Starting(3)),
    (4, StoveState::Starting(4)),
    (5, StoveState::Starting(5)),
    (6, StoveState::Starting(6)),
    (7, StoveState::Starting(7)),
    (8, StoveState::Running),
    (9, StoveState::Stopping(1)),
    (10, StoveState::Stopping(2)),
    (11, StoveState::EcoStop(1)),
    (12, StoveState::EcoStop(2)),
    (13, StoveState::EcoStop(3)),
    (14, StoveState::LowPellet),
    (15, StoveState::EndPellet),
    (16, StoveState::BlackOut),
    (17, StoveState::IgnitionFailed),
    (18, StoveState::AntiFreeze),
    (19, StoveState::CoverOpen),
    (20, StoveState::NoPellet),
    (21, StoveState::Alarm),
];

impl StoveState {
    /// Look up a raw state field; unmapped values pass through
    pub fn from_raw(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|code| {
                STATE_TABLE
                    .iter()
                    .find(|(c, _)| *c == code)
                    .map(|(_, state)| state.clone())
            })
            .unwrap_or_else(|| StoveState::Unknown(raw.to_string()))
    }

    pub fn name(&self) -> String {
        match self {
            StoveState::Off => "off".to_string(),
            StoveState::Starting(n) => format!("starting_{n}"),
            StoveState::Running => "running".to_string(),
            StoveState::Stopping(n) => format!("stopping_{n}"),
            StoveState::EcoStop(n) => format!("eco_stop_{n}"),
            StoveState::LowPellet => "low_pellet".to_string(),
            StoveState::EndPellet => "end_pellet".to_string(),
            StoveState::BlackOut => "black_out".to_string(),
            StoveState::IgnitionFailed => "ignition_failed".to_string(),
            StoveState::AntiFreeze => "anti_freeze".to_string(),
            StoveState::CoverOpen => "cover_open".to_string(),
            StoveState::NoPellet => "no_pellet".to_string(),
            StoveState::Alarm => "alarm".to_string(),
            StoveState::Unknown(raw) => raw.clone(),
        }
    }

    /// Coarse display category; `None` for unknown codes
    pub fn action(&self) -> Option<Action> {
        let action = match self {
            StoveState::Off => Action::Off,
            StoveState::Starting(1) => Action::Check,
            StoveState::Starting(2) => Action::CleanAll,
            StoveState::Starting(3) => Action::Loading,
            StoveState::Starting(4) => Action::Waiting,
            StoveState::Starting(5) | StoveState::Starting(6) => Action::Ignition,
            StoveState::Starting(_) => Action::Stabilization,
            StoveState::Running => Action::Heating,
            StoveState::Stopping(1) => Action::Stopping,
            StoveState::Stopping(_) => Action::CleanAll,
            StoveState::EcoStop(1) => Action::Stopping,
            StoveState::EcoStop(2) => Action::CleanAll,
            StoveState::EcoStop(_) => Action::Idle,
            StoveState::LowPellet | StoveState::AntiFreeze => Action::Heating,
            StoveState::EndPellet | StoveState::BlackOut => Action::Stopping,
            StoveState::IgnitionFailed
            | StoveState::CoverOpen
            | StoveState::NoPellet
            | StoveState::Alarm => Action::Off,
            StoveState::Unknown(_) => return None,
        };
        Some(action)
    }
}

impl fmt::Display for StoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for StoveState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

/// Display category collapsing the lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Off,
    Check,
    CleanAll,
    Loading,
    Waiting,
    Ignition,
    Stabilization,
    Heating,
    Stopping,
    Idle,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Off => "off",
            Action::Check => "check",
            Action::CleanAll => "clean_all",
            Action::Loading => "loading",
            Action::Waiting => "waiting",
            Action::Ignition => "ignition",
            Action::Stabilization => "stabilization",
            Action::Heating => "heating",
            Action::Stopping => "stopping",
            Action::Idle => "idle",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Decoded Records
// ============================================================================

/// Device information from the `info` snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfoRecord {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub firmware_version: Option<String>,
    pub wifi_version: Option<String>,
    pub wifi_mac: Option<String>,
    pub serial_number: Option<String>,
}

impl InfoRecord {
    pub fn decode(snapshot: &Snapshot) -> Self {
        Self {
            manufacturer: text(snapshot, info::MANUFACTURER),
            product: text(snapshot, info::PRODUCT),
            firmware_version: text(snapshot, info::FIRMWARE_VERSION),
            wifi_version: text(snapshot, info::WIFI_VERSION),
            wifi_mac: text(snapshot, info::WIFI_MAC),
            serial_number: text(snapshot, info::SERIAL_NUMBER),
        }
    }
}

/// Temperature and setpoint of one room zone, in °C
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RoomReading {
    pub temperature: Option<f64>,
    pub setpoint: Option<f64>,
}

/// Primary status block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataRecord {
    pub stove_type: Option<u16>,
    pub state: Option<StoveState>,
    pub action: Option<Action>,
    pub alarm_code: Option<i64>,
    pub power_setpoint: Option<i64>,
    pub power_actual: Option<i64>,
    pub rooms: [RoomReading; 3],
    pub exhaust_temperature: Option<f64>,
    pub fan_speeds: [Option<i64>; 3],
    pub eco_mode: Option<bool>,
    pub chrono_mode: Option<bool>,
    pub pellet_level: Option<i64>,
    pub power_switch: Option<bool>,
}

impl DataRecord {
    pub fn decode(snapshot: &Snapshot) -> Self {
        let state = snapshot.field(data::STOVE_STATE).map(StoveState::from_raw);
        let action = state.as_ref().and_then(StoveState::action);
        let stove_type = integer(snapshot, data::STOVE_TYPE).and_then(|v| u16::try_from(v).ok());
        trace!(?state, ?action, ?stove_type, "Decoded data block");

        Self {
            stove_type,
            state,
            action,
            alarm_code: integer(snapshot, data::ALARM_CODE),
            power_setpoint: integer(snapshot, data::POWER_SETPOINT),
            power_actual: integer(snapshot, data::POWER_ACTUAL),
            rooms: data::ROOMS.map(|(temperature, setpoint)| RoomReading {
                temperature: tenths(snapshot, temperature),
                setpoint: tenths(snapshot, setpoint),
            }),
            exhaust_temperature: tenths(snapshot, data::EXHAUST_TEMPERATURE),
            fan_speeds: data::FANS.map(|index| integer(snapshot, index)),
            eco_mode: flag(snapshot, data::ECO_MODE),
            chrono_mode: flag(snapshot, data::CHRONO_MODE),
            pellet_level: integer(snapshot, data::PELLET_LEVEL),
            power_switch: flag(snapshot, data::POWER_SWITCH),
        }
    }

    /// Installed hardware, derived from the stove-type register
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.stove_type.map(Capabilities::from_bits)
    }
}

/// Secondary status block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Data2Record {
    pub flow_switch: Option<bool>,
    pub generic_pump: Option<bool>,
    pub air_exchange: [Option<i64>; 3],
    pub buffer_temperature: Option<f64>,
    pub buffer_setpoint: Option<f64>,
    pub boiler_temperature: Option<f64>,
    pub boiler_setpoint: Option<f64>,
    pub dhw_temperature: Option<f64>,
    pub dhw_setpoint: Option<f64>,
    pub boiler_pump: Option<bool>,
    pub dhw_pump: Option<bool>,
}

impl Data2Record {
    pub fn decode(snapshot: &Snapshot) -> Self {
        Self {
            flow_switch: flag(snapshot, data2::FLOW_SWITCH),
            generic_pump: flag(snapshot, data2::GENERIC_PUMP),
            air_exchange: data2::AIR_EXCHANGE.map(|index| integer(snapshot, index)),
            buffer_temperature: tenths(snapshot, data2::BUFFER_TEMPERATURE),
            buffer_setpoint: tenths(snapshot, data2::BUFFER_SETPOINT),
            boiler_temperature: tenths(snapshot, data2::BOILER_TEMPERATURE),
            boiler_setpoint: tenths(snapshot, data2::BOILER_SETPOINT),
            dhw_temperature: tenths(snapshot, data2::DHW_TEMPERATURE),
            dhw_setpoint: tenths(snapshot, data2::DHW_SETPOINT),
            boiler_pump: flag(snapshot, data2::BOILER_PUMP),
            dhw_pump: flag(snapshot, data2::DHW_PUMP),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::types::SnapshotKind;

    fn snapshot(kind: SnapshotKind, fields: &[&str]) -> Snapshot {
        Snapshot::new(kind, fields.iter().map(|f| f.to_string()).collect())
    }

    // ========================================================================
    // Transform Tests
    // ========================================================================

    #[test]
    fn test_tenths_temperature() {
        let snap = snapshot(SnapshotKind::Data, &["DAT", "215", "-35", "abc"]);
        assert_eq!(tenths(&snap, 1), Some(21.5));
        assert_eq!(tenths(&snap, 2), Some(-3.5));
        assert_eq!(tenths(&snap, 3), None);
        assert_eq!(tenths(&snap, 42), None);
    }

    #[test]
    fn test_integer_and_text() {
        let snap = snapshot(SnapshotKind::Info, &["INF", " 7 ", ""]);
        assert_eq!(integer(&snap, 1), Some(7));
        assert_eq!(integer(&snap, 2), None);
        assert_eq!(text(&snap, 2), Some(String::new()));
        assert_eq!(text(&snap, 3), None);
    }

    // ========================================================================
    // State Table Tests
    // ========================================================================

    #[test]
    fn test_every_state_code_has_exact_name() {
        let expected = [
            "off",
            "starting_1",
            "starting_2",
            "starting_3",
            "starting_4",
            "starting_5",
            "starting_6",
            "starting_7",
            "running",
            "stopping_1",
            "stopping_2",
            "eco_stop_1",
            "eco_stop_2",
            "eco_stop_3",
            "low_pellet",
            "end_pellet",
            "black_out",
            "ignition_failed",
            "anti_freeze",
            "cover_open",
            "no_pellet",
            "alarm",
        ];
        assert_eq!(expected.len(), 22);
        for (code, name) in expected.iter().enumerate() {
            let state = StoveState::from_raw(&code.to_string());
            assert_eq!(state.name(), *name, "code {code}");
            assert!(state.action().is_some(), "code {code}");
        }
    }

    #[test]
    fn test_unknown_state_passes_through_raw() {
        assert_eq!(StoveState::from_raw("99"), StoveState::Unknown("99".into()));
        assert_eq!(StoveState::from_raw("99").name(), "99");
        assert_eq!(StoveState::from_raw("x").name(), "x");
        assert_eq!(StoveState::from_raw("-1").action(), None);
    }

    #[test]
    fn test_action_mapping() {
        assert_eq!(StoveState::Off.action(), Some(Action::Off));
        assert_eq!(StoveState::Starting(1).action(), Some(Action::Check));
        assert_eq!(StoveState::Starting(2).action(), Some(Action::CleanAll));
        assert_eq!(StoveState::Starting(3).action(), Some(Action::Loading));
        assert_eq!(StoveState::Starting(4).action(), Some(Action::Waiting));
        assert_eq!(StoveState::Starting(5).action(), Some(Action::Ignition));
        assert_eq!(StoveState::Starting(7).action(), Some(Action::Stabilization));
        assert_eq!(StoveState::Running.action(), Some(Action::Heating));
        assert_eq!(StoveState::Stopping(1).action(), Some(Action::Stopping));
        assert_eq!(StoveState::EcoStop(3).action(), Some(Action::Idle));
        assert_eq!(StoveState::NoPellet.action(), Some(Action::Off));
    }

    #[test]
    fn test_state_serializes_as_name() {
        let json = serde_json::to_string(&StoveState::EcoStop(2)).unwrap();
        assert_eq!(json, "\"eco_stop_2\"");
        let json = serde_json::to_string(&Action::CleanAll).unwrap();
        assert_eq!(json, "\"clean_all\"");
    }

    // ========================================================================
    // Record Tests
    // ========================================================================

    #[test]
    fn test_decode_info_record() {
        let snap = snapshot(
            SnapshotKind::Info,
            &["INF", "ACME", "Pellet 9", "2.1", "1.4", "AA:BB", "SN42"],
        );
        let rec = InfoRecord::decode(&snap);
        assert_eq!(rec.manufacturer.as_deref(), Some("ACME"));
        assert_eq!(rec.firmware_version.as_deref(), Some("2.1"));
        assert_eq!(rec.serial_number.as_deref(), Some("SN42"));
    }

    #[test]
    fn test_decode_data_record() {
        let snap = snapshot(
            SnapshotKind::Data,
            &[
                "DAT", "2051", "8", "0", "3", "2", "215", "220", "190", "200", "", "", "1450", "4",
                "0", "", "1", "0", "75", "1",
            ],
        );
        let rec = DataRecord::decode(&snap);
        assert_eq!(rec.stove_type, Some(2051));
        assert_eq!(rec.state, Some(StoveState::Running));
        assert_eq!(rec.action, Some(Action::Heating));
        assert_eq!(rec.power_setpoint, Some(3));
        assert_eq!(rec.rooms[0].temperature, Some(21.5));
        assert_eq!(rec.rooms[0].setpoint, Some(22.0));
        assert_eq!(rec.rooms[1].temperature, Some(19.0));
        assert_eq!(rec.rooms[2], RoomReading::default());
        assert_eq!(rec.exhaust_temperature, Some(145.0));
        assert_eq!(rec.fan_speeds, [Some(4), Some(0), None]);
        assert_eq!(rec.eco_mode, Some(true));
        assert_eq!(rec.chrono_mode, Some(false));
        assert_eq!(rec.power_switch, Some(true));

        let caps = rec.capabilities().unwrap();
        // 2051 = 0b1000_0000_0011
        assert!(caps.room1_sensor && caps.room2_sensor);
        assert_eq!(caps.fan_count, 1);
    }

    #[test]
    fn test_decode_short_data_record_is_all_none() {
        let snap = snapshot(SnapshotKind::Data, &["DAT"]);
        let rec = DataRecord::decode(&snap);
        assert_eq!(rec, DataRecord::default());
        assert!(rec.capabilities().is_none());
    }

    #[test]
    fn test_decode_data2_record() {
        let snap = snapshot(
            SnapshotKind::Data2,
            &[
                "DAT", "1", "0", "2", "", "0", "455", "500", "612", "650", "480", "500", "1", "0",
            ],
        );
        let rec = Data2Record::decode(&snap);
        assert_eq!(rec.flow_switch, Some(true));
        assert_eq!(rec.generic_pump, Some(false));
        assert_eq!(rec.air_exchange, [Some(2), None, Some(0)]);
        assert_eq!(rec.buffer_temperature, Some(45.5));
        assert_eq!(rec.boiler_setpoint, Some(65.0));
        assert_eq!(rec.dhw_temperature, Some(48.0));
        assert_eq!(rec.boiler_pump, Some(true));
        assert_eq!(rec.dhw_pump, Some(false));
    }
}
