//! Success records and their on-disk line format.

use crate::types::{Port, ProbeDescriptor};
use std::time::Duration;

/// A probe that qualified as a live stream endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessRecord {
    /// `Server` response header, empty when absent.
    pub server: String,
    pub url: String,
    /// Host in URL form (IPv6 bracketed).
    pub host: String,
    pub port: Port,
    /// Time from sending the request to the decision.
    pub elapsed: Duration,
    /// Download throughput in MB/s, present only for verified streams.
    pub throughput: Option<f64>,
}

impl SuccessRecord {
    /// Record a probe that qualified without downloading.
    pub fn new(descriptor: &ProbeDescriptor, server: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            server: server.into(),
            url: descriptor.url(),
            host: descriptor.host.clone(),
            port: descriptor.port,
            elapsed,
            throughput: None,
        }
    }

    /// Attach a measured throughput.
    pub fn with_throughput(mut self, mb_per_sec: f64) -> Self {
        self.throughput = Some(mb_per_sec);
        self
    }

    /// The descriptive form: server, URL, elapsed time and, when measured, speed.
    pub fn describe(&self) -> String {
        let mut line = format!("Server:{},{}, elapsed: {:.3?}", self.server, self.url, self.elapsed);
        if let Some(speed) = self.throughput {
            line.push_str(&format!(", speed: {:.2} MB/s", speed));
        }
        line
    }

    /// Render the result-file line. `outputs` selects the descriptive form
    /// over the bare `host:port`.
    pub fn render(&self, outputs: bool) -> String {
        if outputs {
            self.describe()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
