//! Temporary download artifacts.
//!
//! Verification writes each download to a file named
//! `stream9527_<host>_<port>_<file>` so stray files from an interrupted run
//! can be recognised and swept.

use crate::types::Port;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Name prefix shared by every artifact.
pub const ARTIFACT_PREFIX: &str = "stream9527_";

/// Derive a file-name fragment from a URL path.
///
/// With a query string, only the part before `?` is used and its file name
/// is restricted to letters, digits, `.`, `_` and `-`. The directory part is
/// folded in, separators are dropped and dots become underscores. Without a
/// query string, only the final path segment is kept.
pub fn generate_filename(url_path: &str) -> String {
    match url_path.split_once('?') {
        Some((path, _)) => {
            let (directory, file) = split_file(path);
            let file: String = file
                .chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
                .collect();
            if directory.is_empty() {
                file
            } else {
                flatten(&clean_join(directory, &file))
            }
        }
        None => flatten(split_file(url_path).1),
    }
}

/// Artifact file name for one verification download.
pub fn artifact_name(host: &str, port: Port, url_path: &str) -> String {
    let host: String = host
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .map(|c| if matches!(c, '.' | ':') { '_' } else { c })
        .collect();
    let file = generate_filename(url_path);
    format!("{}{}_{}_{}", ARTIFACT_PREFIX, host, port, file.trim_matches('_'))
}

/// Delete every artifact left in `dir`. Returns how many were removed.
pub async fn sweep_artifacts(dir: &Path) -> io::Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(ARTIFACT_PREFIX) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => {
                debug!(file = %entry.path().display(), "removed leftover artifact");
                removed += 1;
            }
            Err(e) => warn!(file = %entry.path().display(), error = %e, "failed to remove artifact"),
        }
    }

    Ok(removed)
}

fn split_file(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}

/// Join and lexically clean a path, dropping `.` segments and resolving `..`.
fn clean_join(directory: &str, file: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in directory.split('/').chain(std::iter::once(file)) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn flatten(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':'))
        .map(|c| if c == '.' { '_' } else { c })
        .collect()
}
