//! Command line and environment configuration

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Default location of the preferences file
pub const DEFAULT_PREFS_PATH: &str = "preferences.json";

#[derive(Debug, Parser)]
#[command(
    name = "dep-doubles",
    version,
    about = "Services over injectable storage, filesystem and callback collaborators"
)]
pub struct Cli {
    /// Use in-memory collaborators seeded with demo data
    #[arg(long, env = "DEMO_MODE", global = true)]
    pub demo: bool,

    /// Preferences file used outside demo mode
    #[arg(long, env = "DEP_DOUBLES_PREFS", default_value = DEFAULT_PREFS_PATH, global = true)]
    pub prefs_path: PathBuf,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Read or change the persisted counter
    Counter {
        #[command(subcommand)]
        action: CounterAction,
    },
    /// Create an empty file if it does not exist
    Touch {
        path: String,
        /// Create missing parent directories
        #[arg(long)]
        recursive: bool,
    },
    /// Report whether a path exists
    Exists { path: String },
    /// Exercise every service against fresh in-memory collaborators
    Walkthrough,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CounterAction {
    Show,
    Increment,
    Set {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
}

impl Cli {
    /// Log filter used when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Resolved application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub demo_mode: bool,
    pub prefs_path: PathBuf,
    pub command: Command,
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        Self {
            demo_mode: cli.demo,
            prefs_path: cli.prefs_path,
            command: cli.command,
        }
    }
}
