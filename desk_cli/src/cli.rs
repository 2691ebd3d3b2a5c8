//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "desk", version, about = "Standing desk remote control")]
pub struct Cli {
    /// Path to config TOML; defaults apply when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/desk.toml")]
    pub config: PathBuf,

    /// Emit results (and errors) as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the desk to a height and wait for it to land
    Move {
        /// Target height in inches
        #[arg(long, value_name = "INCHES", conflicts_with_all = ["stand", "sit"])]
        to: Option<f64>,

        /// Use the configured standing height
        #[arg(long, action = ArgAction::SetTrue)]
        stand: bool,

        /// Use the configured sitting height
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "stand")]
        sit: bool,
    },

    /// Stream height changes and run the double-tap and auto-stand loops
    /// until interrupted
    Watch,

    /// Exercise the full control loop against the simulated desk
    SelfCheck,
}
