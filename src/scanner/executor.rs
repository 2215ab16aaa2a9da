//! The production executor: probe, optionally verify, report.

use super::traits::Executor;
use crate::output::RecordSender;
use crate::probe::{ProbeOutcome, Prober};
use crate::types::ProbeDescriptor;
use crate::verify::Verifier;
use async_trait::async_trait;
use tracing::warn;

pub struct ProbeExecutor {
    prober: Prober,
    verifier: Verifier,
    results: RecordSender,
}

impl ProbeExecutor {
    pub fn new(prober: Prober, verifier: Verifier, results: RecordSender) -> Self {
        Self {
            prober,
            verifier,
            results,
        }
    }
}

#[async_trait]
impl Executor for ProbeExecutor {
    async fn execute(&self, descriptor: ProbeDescriptor) {
        let record = match self.prober.probe(&descriptor).await {
            ProbeOutcome::Skip => None,
            ProbeOutcome::RecordSuccess(record) => Some(record),
            ProbeOutcome::TriggerVerification(target) => self.verifier.verify(&target).await,
        };

        if let Some(record) = record {
            if !self.results.send(record).await {
                warn!(url = %descriptor, "result writer stopped, record dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ResultSink, SinkOptions};
    use crate::probe::{build_client, ClientOptions};
    use crate::resolve::StaticResolver;
    use crate::scanner::{GenerationLimiter, ScanOptions, Scanner, WorkerPool};
    use crate::tasks::TaskSource;
    use crate::testutil::{Reply, TestServer};
    use crate::types::Port;
    use reqwest::header::HeaderMap;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    /// Scan `line` against the loopback server and return the result file lines.
    async fn scan(line: &str, paths: &[&str], download_ts: bool, dir: &Path) -> Vec<String> {
        let client = build_client(&ClientOptions {
            timeout: Duration::from_secs(2),
            headers: HeaderMap::new(),
        })
        .unwrap();
        let results_path = dir.join("found.txt");
        let (sink, sender) = ResultSink::open(&results_path, 16, SinkOptions::default()).await.unwrap();

        let executor = Arc::new(ProbeExecutor::new(
            Prober::new(client.clone(), download_ts),
            Verifier::new(client, 4096, dir),
            sender,
        ));
        let pool = WorkerPool::start(2, 64, executor);
        let scanner = Scanner::new(
            TaskSource::new(&[] as &[Port], paths, &[] as &[&str]),
            pool.handle(),
            GenerationLimiter::new(2),
            ScanOptions {
                batch_size: 2,
                host_timeout: Duration::from_secs(2),
            },
        );

        scanner
            .run(format!("{}\n", line).as_bytes(), &StaticResolver::new(), None)
            .await
            .unwrap();
        drop(scanner);
        pool.join().await;
        sink.finish().await;

        std::fs::read_to_string(&results_path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_live_playlist_scenario_records_once() {
        let dir = tempfile::tempdir().unwrap();
        let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\n#EXTINF:5,\nlive.ts\n";
        let server = TestServer::start(vec![
            ("/live.m3u8", Reply::ok("application/vnd.apple.mpegurl", body)),
            ("/live.ts", Reply::ok("video/mp2t", vec![0u8; 8192])),
        ])
        .await;

        let lines = scan(&server.addr().to_string(), &["live.m3u8"], true, dir.path()).await;
        assert_eq!(lines, vec![server.addr().to_string()]);
        // Recorded from the playlist alone; the segment was never fetched.
        assert_eq!(server.seen(), vec!["/live.m3u8"]);
    }

    #[tokio::test]
    async fn test_default_vhost_playlist_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\n_defaultVhost_/live\n";
        let server = TestServer::start(vec![("/index.m3u8", Reply::ok("application/x-mpegurl", body))]).await;

        let lines = scan(&server.addr().to_string(), &["index.m3u8"], true, dir.path()).await;
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_segment_download_verifies_stream() {
        let dir = tempfile::tempdir().unwrap();
        let body = "#EXTM3U\n#EXT-X-VERSION:3\n#EXTINF:10,\n./seg_1.ts\n";
        let server = TestServer::start(vec![
            ("/hls/index.m3u8", Reply::ok("application/x-mpegurl", body)),
            ("/hls/seg_1.ts", Reply::ok("video/mp2t", vec![0u8; 8192])),
        ])
        .await;

        let lines = scan(&server.addr().to_string(), &["hls/index.m3u8"], true, dir.path()).await;
        assert_eq!(lines, vec![server.addr().to_string()]);
        assert_eq!(server.seen(), vec!["/hls/index.m3u8", "/hls/seg_1.ts"]);

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("stream9527_"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_short_media_stream_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(vec![("/live.flv", Reply::ok("video/x-flv", vec![0u8; 100]))]).await;

        let lines = scan(&server.addr().to_string(), &["live.flv"], false, dir.path()).await;
        assert!(lines.is_empty());
        // One probe request plus one verification request.
        assert_eq!(server.hits(), 2);
    }
}
