//! Result file writer.
//!
//! Workers hand records to a bounded channel; a single writer task owns the
//! file and appends one line per record in arrival order.

use super::{plain, SuccessRecord};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// How records are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkOptions {
    /// Write the descriptive form instead of `host:port`.
    pub outputs: bool,
    /// Echo each record to stdout.
    pub echo: bool,
}

/// Cloneable handle for submitting records.
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: mpsc::Sender<SuccessRecord>,
}

impl RecordSender {
    /// Queue a record, waiting while the buffer is full. Returns `false` once
    /// the writer has stopped.
    pub async fn send(&self, record: SuccessRecord) -> bool {
        self.tx.send(record).await.is_ok()
    }
}

/// The running writer task.
pub struct ResultSink {
    handle: JoinHandle<usize>,
}

impl ResultSink {
    /// Truncate `path` and start the writer with a buffer of `capacity` records.
    pub async fn open(
        path: impl AsRef<Path>,
        capacity: usize,
        options: SinkOptions,
    ) -> io::Result<(Self, RecordSender)> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let handle = tokio::spawn(write_records(file, path, rx, options));
        Ok((Self { handle }, RecordSender { tx }))
    }

    /// Wait for every sender to drop and the buffer to drain. Returns the
    /// number of lines written.
    pub async fn finish(self) -> usize {
        match self.handle.await {
            Ok(written) => written,
            Err(e) => {
                error!(error = %e, "result writer task failed");
                0
            }
        }
    }
}

async fn write_records(
    mut file: File,
    path: PathBuf,
    mut rx: mpsc::Receiver<SuccessRecord>,
    options: SinkOptions,
) -> usize {
    let mut written = 0;

    while let Some(record) = rx.recv().await {
        let line = record.render(options.outputs);
        if line.trim().is_empty() {
            continue;
        }
        if options.echo {
            plain::print_found(&record.describe());
        }

        let result = async {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        match result {
            Ok(()) => written += 1,
            Err(e) => error!(file = %path.display(), error = %e, "failed to write result"),
        }
    }

    debug!(file = %path.display(), written, "result writer finished");
    written
}
