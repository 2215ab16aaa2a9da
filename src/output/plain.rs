//! Terminal status lines.
//!
//! Styled with `console`; these are for the operator, not for the result file.

use crate::config::ScanSettings;
use crate::scanner::RunSummary;
use console::style;
use std::path::Path;

/// Print the run header before scanning begins.
pub fn print_scan_header(settings: &ScanSettings, targets: &Path, templates: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("iptv-scan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Targets: {}",
        style("•").dim(),
        style(targets.display()).white().bold()
    );
    println!(
        "{} {} probe templates per host, {} concurrent, {}s timeout",
        style("•").dim(),
        style(templates).white().bold(),
        settings.max_concurrent_requests,
        settings.timeout_secs
    );
    println!(
        "{} Results: {}",
        style("•").dim(),
        style(settings.successful_ips_file.display()).yellow()
    );
    println!();
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &RunSummary, found: usize, elapsed_secs: f64) {
    println!();
    println!(
        "{} {} lines, {} skipped, {} probes queued, peak {} dispatch units",
        style("Scan complete:").green().bold(),
        summary.lines,
        summary.skipped_lines,
        summary.probes,
        summary.peak_units
    );
    println!(
        "               {} endpoints found in {:.2}s",
        style(found).green().bold(),
        elapsed_secs
    );
}

/// Echo a qualifying endpoint.
pub fn print_found(line: &str) {
    println!("{} {}", style("found").green().bold(), line);
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
