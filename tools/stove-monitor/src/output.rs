//! Human-readable report printing

use std::fmt::Display;

use colored::*;
use stove_protocol::{ConnectionState, SessionStatus, StoveReport};

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn celsius(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}°C"))
}

fn on_off(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "on",
        Some(false) => "off",
        None => "-",
    }
}

fn state_label(state: ConnectionState) -> ColoredString {
    let text = state.to_string();
    match state {
        ConnectionState::Connected => text.green(),
        ConnectionState::Connecting => text.yellow(),
        ConnectionState::Disconnected => text.red(),
        ConnectionState::Stopped => text.dimmed(),
    }
}

pub fn print_report(target: &str, report: &StoveReport, status: &SessionStatus) {
    println!("{}", "=".repeat(48).bright_blue());
    println!(
        "{} {}  {}",
        "Stove".bright_cyan(),
        target,
        state_label(report.connection)
    );
    if let Some(updated) = report.updated_at {
        println!("  Updated:      {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(error) = &status.last_error {
        println!("  Last error:   {}", error.yellow());
    }

    if let Some(info) = &report.info {
        println!(
            "  Device:       {} {} (fw {}, wifi {})",
            or_dash(info.manufacturer.as_deref()),
            or_dash(info.product.as_deref()),
            or_dash(info.firmware_version.as_deref()),
            or_dash(info.wifi_version.as_deref()),
        );
    }

    let Some(data) = &report.data else {
        println!("  {}", "No status received yet".dimmed());
        return;
    };

    let state = data
        .state
        .as_ref()
        .map_or_else(|| "-".to_string(), |s| s.name());
    println!(
        "  State:        {} ({})",
        state.bold(),
        or_dash(data.action.map(|a| a.as_str()))
    );
    if let Some(alarm) = data.alarm_code.filter(|code| *code != 0) {
        println!("  Alarm:        {}", alarm.to_string().red());
    }
    println!(
        "  Power:        {} set, {} actual, switch {}",
        or_dash(data.power_setpoint),
        or_dash(data.power_actual),
        on_off(data.power_switch)
    );

    let caps = report.capabilities.unwrap_or_default();
    let sensors = [caps.room1_sensor, caps.room2_sensor, caps.room3_sensor];
    for (index, room) in data.rooms.iter().enumerate() {
        // Show room 1 always; others only when installed
        if index == 0 || sensors[index] {
            println!(
                "  Room {}:       {} -> {}",
                index + 1,
                celsius(room.temperature),
                celsius(room.setpoint)
            );
        }
    }
    println!("  Exhaust:      {}", celsius(data.exhaust_temperature));

    let fan_count = usize::from(caps.fan_count).max(1);
    let fans: Vec<String> = data
        .fan_speeds
        .iter()
        .take(fan_count)
        .map(|speed| or_dash(*speed))
        .collect();
    println!("  Fans:         {}", fans.join(" / "));
    println!(
        "  Eco / chrono: {} / {}",
        on_off(data.eco_mode),
        on_off(data.chrono_mode)
    );
    println!("  Pellet level: {}", or_dash(data.pellet_level));

    if let Some(data2) = &report.data2 {
        if caps.buffer_tank {
            println!(
                "  Buffer:       {} -> {}",
                celsius(data2.buffer_temperature),
                celsius(data2.buffer_setpoint)
            );
        }
        if caps.boiler {
            println!(
                "  Boiler:       {} -> {}, pump {}",
                celsius(data2.boiler_temperature),
                celsius(data2.boiler_setpoint),
                on_off(data2.boiler_pump)
            );
        }
        if caps.domestic_hot_water {
            println!(
                "  Hot water:    {} -> {}, pump {}",
                celsius(data2.dhw_temperature),
                celsius(data2.dhw_setpoint),
                on_off(data2.dhw_pump)
            );
        }
    }

    println!(
        "  Cycles:       {} ok, {} failed, {} queued",
        status.cycles, status.failures, status.pending_commands
    );
}
