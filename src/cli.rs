use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Filament Wizard - first-run setup for printers with filament systems
#[derive(Parser, Debug)]
#[command(name = "filament-wizard")]
#[command(about = "First-run setup wizard for 3D printers with AMS hardware")]
#[command(version)]
pub struct Cli {
    /// Wizard configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "filament_wizard=trace".
    /// RUST_LOG takes precedence.
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive terminal wizard
    Tui,
    /// Walk the wizard headlessly, confirming every screen
    Run {
        /// Give up after this many transitions
        #[arg(long, default_value_t = 32)]
        max_steps: usize,
    },
    /// Detect the filament system from printer object names
    Probe {
        /// Printer object names, comma separated (e.g. "AFC,AFC_stepper lane1")
        #[arg(long, value_delimiter = ',')]
        objects: Vec<String>,

        /// Gate count reported by Happy Hare
        #[arg(long)]
        gates: Option<u32>,

        /// Number of ACE Pro units reported by ValgACE
        #[arg(long)]
        ace_units: Option<u32>,
    },
    /// Validate a configuration file
    CheckConfig {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
