//! Typed write commands
//!
//! A write is a `DAT`/`W` exchange carrying `[register, value]`, where
//! `register` is the position of the matching field in the primary status
//! block. Values use the same encoding as the read side (temperatures in
//! tenths, booleans as `1`/`0`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoveError};
use crate::registers::data;

pub const MIN_POWER_LEVEL: u8 = 1;
pub const MAX_POWER_LEVEL: u8 = 5;
pub const MAX_FAN_SPEED: u8 = 6;
pub const MIN_TARGET_TEMPERATURE: f64 = 5.0;
pub const MAX_TARGET_TEMPERATURE: f64 = 40.0;

/// Parameter change applied on the next poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum StoveCommand {
    SetPower { level: u8 },
    SetTargetTemperature { zone: u8, celsius: f64 },
    SetFanSpeed { fan: u8, speed: u8 },
    SetEco { enabled: bool },
    SetChrono { enabled: bool },
    SetPowerSwitch { on: bool },
}

fn bool_value(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

impl StoveCommand {
    /// Check argument ranges
    pub fn validate(&self) -> Result<()> {
        match *self {
            StoveCommand::SetPower { level } => {
                if !(MIN_POWER_LEVEL..=MAX_POWER_LEVEL).contains(&level) {
                    return Err(StoveError::invalid_command(format!(
                        "power level {level} outside {MIN_POWER_LEVEL}..={MAX_POWER_LEVEL}"
                    )));
                }
            },
            StoveCommand::SetTargetTemperature { zone, celsius } => {
                check_index("zone", zone)?;
                if !celsius.is_finite()
                    || !(MIN_TARGET_TEMPERATURE..=MAX_TARGET_TEMPERATURE).contains(&celsius)
                {
                    return Err(StoveError::invalid_command(format!(
                        "target temperature {celsius} outside \
                         {MIN_TARGET_TEMPERATURE}..={MAX_TARGET_TEMPERATURE}"
                    )));
                }
            },
            StoveCommand::SetFanSpeed { fan, speed } => {
                check_index("fan", fan)?;
                if speed > MAX_FAN_SPEED {
                    return Err(StoveError::invalid_command(format!(
                        "fan speed {speed} above {MAX_FAN_SPEED}"
                    )));
                }
            },
            StoveCommand::SetEco { .. }
            | StoveCommand::SetChrono { .. }
            | StoveCommand::SetPowerSwitch { .. } => {},
        }
        Ok(())
    }

    /// Target register position in the primary block
    ///
    /// Zone and fan are 1-based; call [`validate`](Self::validate) first.
    pub fn register(&self) -> usize {
        match *self {
            StoveCommand::SetPower { .. } => data::POWER_SETPOINT,
            StoveCommand::SetTargetTemperature { zone, .. } => {
                data::ROOMS[usize::from(zone.clamp(1, 3)) - 1].1
            },
            StoveCommand::SetFanSpeed { fan, .. } => data::FANS[usize::from(fan.clamp(1, 3)) - 1],
            StoveCommand::SetEco { .. } => data::ECO_MODE,
            StoveCommand::SetChrono { .. } => data::CHRONO_MODE,
            StoveCommand::SetPowerSwitch { .. } => data::POWER_SWITCH,
        }
    }

    /// Wire value for the register
    pub fn value(&self) -> String {
        match *self {
            StoveCommand::SetPower { level } => level.to_string(),
            StoveCommand::SetTargetTemperature { celsius, .. } => {
                ((celsius * 10.0).round() as i64).to_string()
            },
            StoveCommand::SetFanSpeed { speed, .. } => speed.to_string(),
            StoveCommand::SetEco { enabled } | StoveCommand::SetChrono { enabled } => {
                bool_value(enabled)
            },
            StoveCommand::SetPowerSwitch { on } => bool_value(on),
        }
    }

    /// Parameter list queued for the write exchange
    pub fn to_parameters(&self) -> Vec<String> {
        vec![self.register().to_string(), self.value()]
    }
}

fn check_index(what: &str, index: u8) -> Result<()> {
    if (1..=3).contains(&index) {
        Ok(())
    } else {
        Err(StoveError::invalid_command(format!(
            "{what} {index} outside 1..=3"
        )))
    }
}

impl fmt::Display for StoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoveCommand::SetPower { level } => write!(f, "power={level}"),
            StoveCommand::SetTargetTemperature { zone, celsius } => {
                write!(f, "room{zone} target={celsius:.1}")
            },
            StoveCommand::SetFanSpeed { fan, speed } => write!(f, "fan{fan} speed={speed}"),
            StoveCommand::SetEco { enabled } => write!(f, "eco={enabled}"),
            StoveCommand::SetChrono { enabled } => write!(f, "chrono={enabled}"),
            StoveCommand::SetPowerSwitch { on } => write!(f, "power_switch={on}"),
        }
    }
}
