//! Subcommand implementations

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::*;
use stove_protocol::codec::{self, Command, Frame, Mode};
use stove_protocol::{PollingSession, StoveCommand, StoveConfig, StoveError};
use tracing::info;

use crate::output;

// ============================================================================
// watch
// ============================================================================

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between printed reports
    #[arg(short, long, default_value_t = 5)]
    pub interval_secs: u64,

    /// Stop after this many reports
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
}

pub async fn watch(config: StoveConfig, args: &WatchArgs, json: bool) -> Result<()> {
    if args.interval_secs == 0 {
        bail!("--interval-secs must be greater than 0");
    }

    let target = config.address();
    let session = PollingSession::new(config);
    session.start();

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs));
    // First tick completes immediately; skip it so the first report has data
    ticker.tick().await;
    let mut printed = 0u64;

    loop {
        tokio::select! {
            signal = common::wait_for_shutdown() => {
                info!("{} received, stopping", signal);
                break;
            },
            _ = ticker.tick() => {
                let report = session.report();
                if json {
                    println!("{}", serde_json::to_string(&report)?);
                } else {
                    output::print_report(&target, &report, &session.status());
                }
                printed += 1;
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            },
        }
    }

    session.stop();
    session.stopped().await;
    Ok(())
}

// ============================================================================
// send
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> bool {
        toggle == Toggle::On
    }
}

#[derive(Subcommand, Debug)]
pub enum SendCommand {
    /// Power level 1-5
    Power { level: u8 },
    /// Target temperature of a room zone (1-3) in °C
    Temp { zone: u8, celsius: f64 },
    /// Fan (1-3) speed 0-6
    Fan { fan: u8, speed: u8 },
    /// Eco mode
    Eco {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Chrono (schedule) mode
    Chrono {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Switch the stove on
    On,
    /// Switch the stove off
    Off,
}

impl SendCommand {
    pub fn to_stove_command(&self) -> StoveCommand {
        match *self {
            SendCommand::Power { level } => StoveCommand::SetPower { level },
            SendCommand::Temp { zone, celsius } => {
                StoveCommand::SetTargetTemperature { zone, celsius }
            },
            SendCommand::Fan { fan, speed } => StoveCommand::SetFanSpeed { fan, speed },
            SendCommand::Eco { state } => StoveCommand::SetEco {
                enabled: state.into(),
            },
            SendCommand::Chrono { state } => StoveCommand::SetChrono {
                enabled: state.into(),
            },
            SendCommand::On => StoveCommand::SetPowerSwitch { on: true },
            SendCommand::Off => StoveCommand::SetPowerSwitch { on: false },
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(subcommand)]
    pub command: SendCommand,

    /// Give up if the stove has not taken the command after this many seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub wait_secs: u64,
}

pub async fn send(config: StoveConfig, args: &SendArgs) -> Result<()> {
    let command = args.command.to_stove_command();
    let target = config.address();
    let session = PollingSession::new(config);
    session.enqueue(command)?;
    session.start();

    let wait = Duration::from_secs(args.wait_secs);
    let outcome = tokio::select! {
        result = tokio::time::timeout(wait, session.drained()) => result
            .map_err(|_| anyhow!("{} still queued after {}s", command, args.wait_secs))
            .and_then(|drained| drained.map_err(Into::into)),
        signal = common::wait_for_shutdown() => Err(anyhow!("Interrupted by {}", signal)),
    };

    let last_error = session.status().last_error;
    session.stop();
    session.stopped().await;

    match outcome {
        Ok(()) => {
            println!("{} {} -> {}", "OK".green(), command, target);
            Ok(())
        },
        Err(e) => {
            println!("{} {} -> {}", "FAIL".red(), command, target);
            match last_error {
                Some(last) => Err(e.context(last)),
                None => Err(e),
            }
        },
    }
}

// ============================================================================
// frame
// ============================================================================

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Command code: INF or DAT
    pub command: String,

    /// Mode: R, W or E
    pub mode: String,

    /// Parameters, joined with ';'
    pub params: Vec<String>,
}

impl FrameArgs {
    fn to_frame(&self) -> Result<Frame> {
        let command = Command::from_code(&self.command.to_ascii_uppercase())
            .ok_or_else(|| StoveError::invalid_command(format!("unknown command {}", self.command)))?;
        let mut chars = self.mode.chars();
        let mode = match (chars.next(), chars.next()) {
            (Some(c), None) => Mode::from_char(c.to_ascii_uppercase()),
            _ => None,
        }
        .ok_or_else(|| StoveError::invalid_command(format!("unknown mode {}", self.mode)))?;

        Ok(Frame::new(command, mode, self.params.iter().cloned()))
    }
}

pub fn frame(args: &FrameArgs, json: bool) -> Result<()> {
    let frame = args.to_frame()?;
    let wire = frame.to_wire_string();
    let body = wire
        .get(1..wire.len().saturating_sub(4))
        .ok_or_else(|| anyhow!("encoded frame too short"))?;
    let crc = codec::checksum_hex(body);

    if json {
        let value = serde_json::json!({
            "command": frame.command(),
            "mode": frame.mode(),
            "parameters": frame.parameters(),
            "wire": format!("{wire}\n"),
            "checksum": crc,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} {}", "Frame:".bright_cyan(), wire);
        println!("{} {}", "CRC:".bright_cyan(), crc);
        println!("{} {}", "Bytes:".bright_cyan(), frame.encode().len());
    }
    Ok(())
}
