//! Probe templates for a resolved host.
//!
//! A host is tried on the cross product of configured ports and URL path
//! templates, followed by the fixed ("non-cycling") `port/path` pairs.

use crate::template::{self, TemplateError};
use crate::types::{Port, ProbeDescriptor};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use tracing::warn;

/// A port and a path that may still contain time macros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTemplate {
    pub port: Port,
    pub path: String,
}

impl ProbeTemplate {
    pub fn new(port: Port, path: impl Into<String>) -> Self {
        Self {
            port,
            path: path.into(),
        }
    }

    /// Parse a fixed pair written as `port/path`.
    pub fn parse_pair(entry: &str) -> Option<Self> {
        let (port, path) = entry.trim().split_once('/')?;
        let port = port.parse().ok()?;
        Some(Self::new(port, path))
    }

    /// Bind the template to `host`, expanding macros with `now`.
    pub fn resolve<Tz>(&self, host: &str, now: &DateTime<Tz>) -> Result<ProbeDescriptor, TemplateError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let path = template::expand(&self.path, now)?;
        Ok(ProbeDescriptor::new(host, self.port, path))
    }
}

/// The list of probe templates every scanned host goes through.
#[derive(Debug, Clone, Default)]
pub struct TaskSource {
    paths: Vec<String>,
    templates: Vec<ProbeTemplate>,
}

impl TaskSource {
    /// Build the template list. Malformed fixed pairs are reported and skipped.
    pub fn new<P, F>(ports: &[Port], paths: &[P], fixed_pairs: &[F]) -> Self
    where
        P: AsRef<str>,
        F: AsRef<str>,
    {
        let paths: Vec<String> = paths.iter().map(|p| p.as_ref().to_string()).collect();

        let mut templates: Vec<ProbeTemplate> = ports
            .iter()
            .flat_map(|&port| paths.iter().map(move |path| ProbeTemplate::new(port, path.clone())))
            .collect();

        for entry in fixed_pairs {
            match ProbeTemplate::parse_pair(entry.as_ref()) {
                Some(template) => templates.push(template),
                None => warn!(entry = entry.as_ref(), "ignoring malformed port/path pair"),
            }
        }

        Self { paths, templates }
    }

    /// Every template in probe order.
    pub fn templates(&self) -> &[ProbeTemplate] {
        &self.templates
    }

    /// Templates for a host whose port is already known: every path on that
    /// port, or the root path when no paths are configured.
    pub fn for_port(&self, port: Port) -> Vec<ProbeTemplate> {
        if self.paths.is_empty() {
            return vec![ProbeTemplate::new(port, "")];
        }
        self.paths
            .iter()
            .map(|path| ProbeTemplate::new(port, path.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
