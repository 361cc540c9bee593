//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// Bulk harvester: connect to every device in the inventory, run its
/// platform's inspection commands, and file the output per device.
#[derive(Debug, Parser)]
#[command(name = "harvessh", version, about)]
pub struct Cli {
    /// Inventory table of devices and credentials.
    #[arg(short = 'i', long)]
    pub inventory: PathBuf,

    /// Directory holding `shows_<device_type>.txt` command lists.
    #[arg(long, default_value = "shows")]
    pub shows: PathBuf,

    /// Directory that receives the timestamped run folder.
    #[arg(short = 'o', long, default_value = "Output")]
    pub output: PathBuf,

    /// Number of devices to connect to at once.
    #[arg(short = 't', long = "threads")]
    pub threads: Option<String>,

    /// Accept a worker count above the normal limit.
    #[arg(long)]
    pub force: bool,

    /// Suppress most output.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Log level filter implied by the verbosity flags.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
