//! Command-line interface definitions for iptv-scan.
//!
//! Uses `clap` derive macros for declarative argument parsing.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Discover live IPTV endpoints across address spaces.
#[derive(Parser, Debug)]
#[command(name = "iptv-scan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Probe hosts for live IPTV streams", long_about = None)]
pub struct Args {
    /// Settings file (defaults to ./config.json, then the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target file, overriding `cidrFile` from the settings
    #[arg(short, long, value_name = "PATH")]
    pub targets: Option<PathBuf>,

    /// Show a progress bar over target lines
    #[arg(long)]
    pub progress: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only, no start or summary banner
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Default log directive when `RUST_LOG` is not set.
    pub fn log_level(&self, log_enabled: bool) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else if log_enabled {
            "info"
        } else {
            "error"
        }
    }
}

/// Progress bar over `total` target lines.
pub fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
