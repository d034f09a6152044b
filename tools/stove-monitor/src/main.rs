//! stove-monitor - pellet stove command line tool
//!
//! Polls a stove over its WiFi module, prints decoded status, and queues
//! parameter changes.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{LogConfig, LogFormat};
use stove_protocol::StoveConfig;

use crate::commands::{FrameArgs, SendArgs, WatchArgs};

#[derive(Parser, Debug)]
#[command(name = "stove-monitor")]
#[command(about = "Monitor and control a pellet stove WiFi controller")]
#[command(long_about = "Monitor and control a pellet stove WiFi controller

Examples:
  stove-monitor --host 192.168.1.40 watch          # Print status every 5 s
  stove-monitor --host 192.168.1.40 send power 3   # Set power level 3
  stove-monitor --host 192.168.1.40 send temp 1 21.5
  stove-monitor frame DAT R 0                      # Show an encoded frame

Settings are read from --config, then STOVE_* environment variables,
then the flags below.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Stove address (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Stove TCP port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Log filter, e.g. `debug` or `stove_protocol=trace`
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log line format: compact, pretty or json
    #[arg(long, global = true, default_value = "compact")]
    log_format: String,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the stove and print a report at a fixed interval
    Watch(WatchArgs),

    /// Queue one parameter change and wait until the stove accepted it
    Send(SendArgs),

    /// Print the encoded form of a request frame (no connection)
    Frame(FrameArgs),
}

impl Cli {
    fn stove_config(&self) -> Result<StoveConfig> {
        let mut config = StoveConfig::load(self.config.as_deref())
            .context("Failed to load stove configuration")?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.validate()?;
        Ok(config)
    }

    fn log_config(&self) -> Result<LogConfig> {
        let format: LogFormat = self.log_format.parse()?;
        Ok(LogConfig {
            level: self.log_level.clone(),
            format,
            ansi: !self.no_color,
            file: None,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _log_guard = common::init_logging(&cli.log_config()?)?;

    match &cli.command {
        Commands::Watch(args) => commands::watch(cli.stove_config()?, args, cli.json).await,
        Commands::Send(args) => commands::send(cli.stove_config()?, args).await,
        Commands::Frame(args) => commands::frame(args, cli.json),
    }
}
