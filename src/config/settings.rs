//! Scan settings.
//!
//! Settings are read from a JSON file whose keys follow the established
//! layout of the tool's configuration (`maxConcurrentRequests`, `timeOut`,
//! `uaHeaders`, ...). Missing keys take their defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::tasks::TaskSource;
use crate::types::{Port, PortSpec};
use directories::ProjectDirs;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory, then in the config directory.
pub const SETTINGS_FILE: &str = "config.json";

/// Everything a scan run is configured with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Port entries, each `N` or `N-M`.
    pub ports: Vec<String>,
    /// URL path templates probed on every port.
    #[serde(rename = "urlPaths")]
    pub url_paths: Vec<String>,
    /// Fixed `port/path` pairs probed once per host.
    #[serde(rename = "non_ports_path")]
    pub fixed_pairs: Vec<String>,
    /// Worker count, generation limiter capacity and batch size.
    #[serde(rename = "maxConcurrentRequests")]
    pub max_concurrent_requests: usize,
    #[serde(rename = "successfulIPsFile")]
    pub successful_ips_file: PathBuf,
    /// Extra request headers, each name with one or more values.
    #[serde(rename = "uaHeaders")]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Line-oriented target file.
    #[serde(rename = "cidrFile")]
    pub cidr_file: PathBuf,
    /// Seconds; bounds every request and each host's dispatch loop.
    #[serde(rename = "timeOut")]
    pub timeout_secs: u64,
    /// Verification threshold in MB.
    #[serde(rename = "downSize")]
    pub down_size_mb: f64,
    /// Result channel capacity.
    #[serde(rename = "filebufferSize")]
    pub file_buffer_size: usize,
    /// Verify media playlists by downloading their first segment.
    pub download_ts: bool,
    /// Write descriptive result lines instead of `host:port`.
    pub outputs: bool,
    #[serde(rename = "logEnabled")]
    pub log_enabled: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            ports: vec!["80".to_string()],
            url_paths: Vec::new(),
            fixed_pairs: Vec::new(),
            max_concurrent_requests: 100,
            successful_ips_file: PathBuf::from("successful_ips.txt"),
            headers: BTreeMap::new(),
            cidr_file: PathBuf::from("cidr.txt"),
            timeout_secs: 5,
            down_size_mb: 1.0,
            file_buffer_size: 1024,
            download_ts: false,
            outputs: true,
            log_enabled: false,
        }
    }
}

impl ScanSettings {
    /// Load and validate settings from `path`.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate settings from a JSON document.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let settings: Self = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings a run cannot start with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxConcurrentRequests",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeOut",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if !(self.down_size_mb.is_finite() && self.down_size_mb > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "downSize",
                reason: format!("must be a positive size in MB, got {}", self.down_size_mb),
            });
        }
        self.ports()?;
        self.header_map()?;
        Ok(())
    }

    /// Configured ports in order, duplicates removed.
    pub fn ports(&self) -> ConfigResult<Vec<Port>> {
        if self.ports.is_empty() {
            return Ok(Vec::new());
        }
        Ok(PortSpec::from_entries(&self.ports)?.to_ports())
    }

    /// The templates every host is probed with.
    pub fn task_source(&self) -> ConfigResult<TaskSource> {
        Ok(TaskSource::new(&self.ports()?, &self.url_paths, &self.fixed_pairs))
    }

    /// Request headers sent with every probe.
    pub fn header_map(&self) -> ConfigResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, values) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            for value in values {
                let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
                map.append(header.clone(), value);
            }
        }
        Ok(map)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Verification threshold in bytes.
    pub fn download_threshold(&self) -> u64 {
        (self.down_size_mb * 1024.0 * 1024.0) as u64
    }

    /// Task queue capacity for the worker pool.
    pub fn queue_capacity(&self) -> usize {
        self.max_concurrent_requests.saturating_mul(1024)
    }
}

/// Where settings are read from when no path is given: `config.json` in the
/// working directory if present, else the platform config directory.
pub fn default_settings_path() -> ConfigResult<PathBuf> {
    let local = PathBuf::from(SETTINGS_FILE);
    if local.exists() {
        return Ok(local);
    }
    let project = ProjectDirs::from("", "", "iptv-scan").ok_or(ConfigError::DirectoryNotFound)?;
    Ok(project.config_dir().join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ScanSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.queue_capacity(), 100 * 1024);
        assert_eq!(settings.download_threshold(), 1024 * 1024);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_original_key_layout() {
        let json = r#"{
            "ports": ["8080", "9000-9002"],
            "urlPaths": ["hls/1/index.m3u8"],
            "non_ports_path": ["9901/tsfile/live/0001_1.m3u8"],
            "maxConcurrentRequests": 20,
            "successfulIPsFile": "found.txt",
            "uaHeaders": {"User-Agent": ["okhttp/3.12"], "Accept": ["*/*"]},
            "cidrFile": "targets.txt",
            "timeOut": 3,
            "downSize": 0.5,
            "filebufferSize": 64,
            "download_ts": true,
            "outputs": false,
            "logEnabled": true
        }"#;
        let settings = ScanSettings::from_json(json).unwrap();

        let ports: Vec<u16> = settings.ports().unwrap().iter().map(|p| p.as_u16()).collect();
        assert_eq!(ports, vec![8080, 9000, 9001, 9002]);
        assert_eq!(settings.max_concurrent_requests, 20);
        assert_eq!(settings.download_threshold(), 512 * 1024);
        assert_eq!(settings.cidr_file, PathBuf::from("targets.txt"));
        assert!(settings.download_ts && !settings.outputs && settings.log_enabled);

        let headers = settings.header_map().unwrap();
        assert_eq!(headers.get("user-agent").unwrap(), "okhttp/3.12");
        assert_eq!(settings.task_source().unwrap().len(), 5);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings = ScanSettings::from_json(r#"{"timeOut": 9}"#).unwrap();
        assert_eq!(settings.timeout_secs, 9);
        assert_eq!(settings.max_concurrent_requests, 100);
        assert!(settings.outputs);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        for json in [
            r#"{"maxConcurrentRequests": 0}"#,
            r#"{"timeOut": 0}"#,
            r#"{"downSize": 0}"#,
            r#"{"downSize": -1.5}"#,
            r#"{"ports": ["http"]}"#,
            r#"{"ports": ["90-80"]}"#,
            r#"{"uaHeaders": {"Bad Header": ["x"]}}"#,
            r#"{"uaHeaders": {"X-Ok": ["line\nbreak"]}}"#,
        ] {
            assert!(ScanSettings::from_json(json).is_err(), "{} accepted", json);
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ScanSettings::from_json("{ports: 80"),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"ports": ["81"]}"#).unwrap();
        assert_eq!(ScanSettings::load_from(&path).unwrap().ports, vec!["81"]);

        let missing = ScanSettings::load_from(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::ReadFailed { .. })));
    }
}
