//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "exloop",
    version,
    about = "Exercising in the Loop: glucose projection and insulin-on-board replay"
)]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/exloop_config.toml")]
    pub config: PathBuf,

    /// Print results and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay cumulative active-energy samples through the projection pipeline
    Project {
        /// Current glucose reading in mg/dL
        #[arg(long, value_name = "MG_DL")]
        glucose: f64,
        /// Insulin deliveries to seed the store with (strict header: minutes_ago,units)
        #[arg(long, value_name = "FILE")]
        insulin_history: Option<PathBuf>,
        /// Cumulative active energy in kcal; repeat once per sample
        #[arg(long, value_name = "N", required = true, num_args = 1)]
        kcal: Vec<f64>,
        /// Pause the workout after this many samples
        #[arg(long, value_name = "K")]
        pause_after: Option<usize>,
        /// End the workout after this many samples
        #[arg(long, value_name = "K")]
        end_after: Option<usize>,
    },
    /// Show or change the insulin sensitivity factor preference
    Isf {
        #[command(subcommand)]
        action: IsfAction,
    },
    /// Validate the config and preference store without running a workout
    SelfCheck,
}

#[derive(Subcommand, Debug)]
pub enum IsfAction {
    /// Print the effective ISF and where it came from
    Show,
    /// Save a new ISF (mg/dL per unit, whole number)
    Set {
        #[arg(value_name = "VALUE")]
        value: u32,
    },
}
