//! # iptv-scan - Live IPTV Endpoint Discovery
//!
//! iptv-scan probes `host:port/path` combinations over HTTP across CIDR
//! blocks, address ranges, single hosts and domain names, classifies the
//! responses by content signature and optionally confirms streams with a
//! timed partial download.
//!
//! ## Pipeline
//!
//! target line → [`types::ScanTarget`] → [`cidr`] enumeration →
//! [`tasks::TaskSource`] → [`scanner::Scanner`] → [`scanner::WorkerPool`] →
//! [`probe::Prober`] → [`classify`] → [`verify::Verifier`] →
//! [`output::ResultSink`]
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use iptv_scan::config::ScanSettings;
//! use iptv_scan::probe::{build_client, ClientOptions, Prober};
//! use iptv_scan::types::{Port, ProbeDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ScanSettings::default();
//!     let client = build_client(&ClientOptions {
//!         timeout: settings.timeout(),
//!         headers: settings.header_map()?,
//!     })?;
//!     let prober = Prober::new(client, settings.download_ts);
//!
//!     let target = ProbeDescriptor::new("192.0.2.5", Port::new(8080).unwrap(), "live.m3u8");
//!     println!("{:?}", prober.probe(&target).await);
//!     Ok(())
//! }
//! ```

pub mod cidr;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod probe;
pub mod resolve;
pub mod scanner;
pub mod tasks;
pub mod template;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use error::{ConfigError, ScanError};
pub use scanner::{RunSummary, Scanner};
pub use types::{Port, ProbeDescriptor, ScanTarget};
