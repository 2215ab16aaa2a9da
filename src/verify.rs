//! Download-based stream verification.
//!
//! A candidate counts as a live stream only when it delivers at least the
//! configured number of bytes before the request timeout. The bytes go to a
//! temporary artifact in the work directory, which is removed on every path.

use crate::error::ScanResult;
use crate::output::{artifact_name, SuccessRecord};
use crate::probe::{self, get_ok, request_error};
use crate::types::ProbeDescriptor;
use reqwest::header::SERVER;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone)]
pub struct Verifier {
    client: Client,
    threshold: u64,
    work_dir: PathBuf,
}

impl Verifier {
    /// `threshold` is in bytes; artifacts are written under `work_dir`.
    pub fn new(client: Client, threshold: u64, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            threshold,
            work_dir: work_dir.into(),
        }
    }

    /// Download until the threshold is reached. Returns a record with the
    /// measured throughput, or `None` when the stream failed or ended early.
    pub async fn verify(&self, descriptor: &ProbeDescriptor) -> Option<SuccessRecord> {
        let url = descriptor.url();
        let started = Instant::now();

        let response = match get_ok(&self.client, &url).await {
            Ok(response) => response,
            Err(e) => {
                probe::log_failure(&e);
                return None;
            }
        };
        let server = probe::header(&response, SERVER.as_str()).unwrap_or_default();

        let artifact = self
            .work_dir
            .join(artifact_name(&descriptor.host, descriptor.port, &descriptor.path));
        let downloaded = self.download(response, &url, &artifact).await;
        remove_artifact(&artifact).await;

        let received = match downloaded {
            Ok(received) => received,
            Err(e) => {
                debug!(%url, error = %e, "verification download failed");
                return None;
            }
        };

        if received < self.threshold {
            debug!(%url, received, threshold = self.threshold, "stream ended below threshold");
            return None;
        }

        let elapsed = started.elapsed();
        let speed = received as f64 / BYTES_PER_MB / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(%url, ?elapsed, speed_mb_s = speed, "stream verified");
        Some(SuccessRecord::new(descriptor, server, elapsed).with_throughput(speed))
    }

    async fn download(&self, mut response: Response, url: &str, artifact: &Path) -> ScanResult<u64> {
        let mut file = File::create(artifact).await?;
        let mut received: u64 = 0;

        while received < self.threshold {
            let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? else {
                break;
            };
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(received)
    }
}

async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(file = %path.display(), error = %e, "failed to remove artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ARTIFACT_PREFIX;
    use crate::probe::{build_client, ClientOptions};
    use crate::testutil::{Reply, TestServer};
    use crate::types::Port;
    use reqwest::header::HeaderMap;
    use std::time::Duration;

    fn verifier(threshold: u64, dir: &Path) -> Verifier {
        let client = build_client(&ClientOptions {
            timeout: Duration::from_secs(2),
            headers: HeaderMap::new(),
        })
        .unwrap();
        Verifier::new(client, threshold, dir)
    }

    fn descriptor(server: &TestServer, path: &str) -> ProbeDescriptor {
        let addr = server.addr();
        ProbeDescriptor::for_ip(addr.ip(), Port::new(addr.port()).unwrap(), path)
    }

    fn leftovers(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(ARTIFACT_PREFIX))
            .count()
    }

    #[tokio::test]
    async fn test_threshold_reached() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(vec![(
            "/live.ts",
            Reply::ok("video/mp2t", vec![0x47u8; 64 * 1024]).header("Server", "udpxy"),
        )])
        .await;

        let record = verifier(32 * 1024, dir.path())
            .verify(&descriptor(&server, "live.ts"))
            .await
            .expect("stream should verify");
        assert_eq!(record.server, "udpxy");
        assert!(record.throughput.unwrap() > 0.0);
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_short_stream_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(vec![("/short.ts", Reply::ok("video/mp2t", vec![1u8; 1000]))]).await;

        let record = verifier(4096, dir.path()).verify(&descriptor(&server, "short.ts")).await;
        assert!(record.is_none());
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_request_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(vec![("/x", Reply::status(500))]).await;

        assert!(verifier(1, dir.path()).verify(&descriptor(&server, "missing")).await.is_none());
        assert!(verifier(1, dir.path()).verify(&descriptor(&server, "x")).await.is_none());
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_unwritable_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let server = TestServer::start(vec![("/a.ts", Reply::ok("video/mp2t", vec![0u8; 2048]))]).await;

        assert!(verifier(1024, &missing).verify(&descriptor(&server, "a.ts")).await.is_none());
        assert!(!missing.exists());
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_connection_dropped_mid_download() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(vec![(
            "/cut.ts",
            Reply::ok("video/mp2t", vec![0x47u8; 5000]).truncated(1_000_000),
        )])
        .await;

        let record = verifier(100_000, dir.path()).verify(&descriptor(&server, "cut.ts")).await;
        assert!(record.is_none());
        assert_eq!(server.hits(), 1);
        assert_eq!(leftovers(dir.path()), 0);
    }
}
