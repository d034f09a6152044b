//! Stove-type bitfield decoding
//!
//! The stove-type register advertises which optional hardware is installed.
//! Bit layout, LSB first:
//!
//! ```text
//! bit  0  room 1 temperature sensor
//! bit  1  room 2 temperature sensor
//! bit  2  room 3 temperature sensor
//! bit  3  domestic hot water
//! bit  4  boiler
//! bit  5  buffer tank
//! bit  6  flow switch
//! bit  7  generic pump
//! bit  8  air exchange zone 1
//! bit  9  air exchange zone 2
//! bit 10  air exchange zone 3
//! bit 11-12  fan count (0..=3)
//! bit 13-15  reserved
//! ```

use serde::{Deserialize, Serialize};

pub const BIT_ROOM1_SENSOR: u8 = 0;
pub const BIT_ROOM2_SENSOR: u8 = 1;
pub const BIT_ROOM3_SENSOR: u8 = 2;
pub const BIT_DHW: u8 = 3;
pub const BIT_BOILER: u8 = 4;
pub const BIT_BUFFER_TANK: u8 = 5;
pub const BIT_FLOW_SWITCH: u8 = 6;
pub const BIT_GENERIC_PUMP: u8 = 7;
pub const BIT_AIR_EXCHANGE1: u8 = 8;
pub const BIT_AIR_EXCHANGE2: u8 = 9;
pub const BIT_AIR_EXCHANGE3: u8 = 10;
pub const FAN_COUNT_SHIFT: u8 = 11;
pub const FAN_COUNT_MASK: u16 = 0b11;

/// Installed-hardware flags derived from the stove-type register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub room1_sensor: bool,
    pub room2_sensor: bool,
    pub room3_sensor: bool,
    pub domestic_hot_water: bool,
    pub boiler: bool,
    pub buffer_tank: bool,
    pub flow_switch: bool,
    pub generic_pump: bool,
    pub air_exchange1: bool,
    pub air_exchange2: bool,
    pub air_exchange3: bool,
    pub fan_count: u8,
}

#[inline]
fn bit(value: u16, position: u8) -> bool {
    (value >> position) & 1 == 1
}

impl Capabilities {
    pub fn from_bits(stove_type: u16) -> Self {
        Self {
            room1_sensor: bit(stove_type, BIT_ROOM1_SENSOR),
            room2_sensor: bit(stove_type, BIT_ROOM2_SENSOR),
            room3_sensor: bit(stove_type, BIT_ROOM3_SENSOR),
            domestic_hot_water: bit(stove_type, BIT_DHW),
            boiler: bit(stove_type, BIT_BOILER),
            buffer_tank: bit(stove_type, BIT_BUFFER_TANK),
            flow_switch: bit(stove_type, BIT_FLOW_SWITCH),
            generic_pump: bit(stove_type, BIT_GENERIC_PUMP),
            air_exchange1: bit(stove_type, BIT_AIR_EXCHANGE1),
            air_exchange2: bit(stove_type, BIT_AIR_EXCHANGE2),
            air_exchange3: bit(stove_type, BIT_AIR_EXCHANGE3),
            fan_count: ((stove_type >> FAN_COUNT_SHIFT) & FAN_COUNT_MASK) as u8,
        }
    }

    /// Number of room sensors present
    pub fn room_sensor_count(&self) -> usize {
        [self.room1_sensor, self.room2_sensor, self.room3_sensor]
            .iter()
            .filter(|present| **present)
            .count()
    }

    /// Number of air-exchange zones present
    pub fn air_exchange_count(&self) -> usize {
        [self.air_exchange1, self.air_exchange2, self.air_exchange3]
            .iter()
            .filter(|present| **present)
            .count()
    }
}

impl From<u16> for Capabilities {
    fn from(stove_type: u16) -> Self {
        Self::from_bits(stove_type)
    }
}
