//! Scanner module - turns target lines into probe tasks.
//!
//! Two independent bounds apply. The [`WorkerPool`] caps how many probes run
//! at once; the [`GenerationLimiter`] caps how many dispatch units expand
//! templates into tasks at once. A dispatch unit is one host of an
//! enumeration batch, one template of a domain target, or one endpoint line.
//!
//! Address blocks are walked in batches no larger than the limiter capacity,
//! and a batch must have every one of its probes executed before the next
//! batch is generated.

mod executor;
mod limiter;
mod pool;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;

pub use executor::ProbeExecutor;
pub use limiter::GenerationLimiter;
pub use pool::{PoolHandle, WorkerPool};
pub use traits::{BatchGroup, CompletionToken, Executor, Task};

use crate::cidr::{ip_range_to_cidrs, single_host_network, EnumerationCursor};
use crate::error::ScanResult;
use crate::resolve::Resolver;
use crate::tasks::{ProbeTemplate, TaskSource};
use crate::types::{url_host, Port, ScanTarget, TargetError};
use chrono::Local;
use futures::future::join_all;
use indicatif::ProgressBar;
use ipnetwork::IpNetwork;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Non-blank, non-comment lines read.
    pub lines: u64,
    /// Lines dropped as malformed or unresolvable.
    pub skipped_lines: u64,
    /// Dispatch units started.
    pub units: u64,
    /// Tasks handed to the pool.
    pub probes: u64,
    /// Most dispatch units running at the same moment.
    pub peak_units: u64,
}

/// Scheduling parameters.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Hosts per enumeration batch; normally the limiter capacity.
    pub batch_size: usize,
    /// How long one host's dispatch loop may run.
    pub host_timeout: Duration,
}

struct Shared {
    tasks: TaskSource,
    pool: PoolHandle,
    host_timeout: Duration,
    units: AtomicU64,
    active_units: AtomicU64,
    peak_units: AtomicU64,
    probes: AtomicU64,
}

/// Drives target lines through classification, enumeration and dispatch.
pub struct Scanner {
    shared: Arc<Shared>,
    limiter: GenerationLimiter,
    batch_size: usize,
}

impl Scanner {
    pub fn new(
        tasks: TaskSource,
        pool: PoolHandle,
        limiter: GenerationLimiter,
        options: ScanOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                tasks,
                pool,
                host_timeout: options.host_timeout,
                units: AtomicU64::new(0),
                active_units: AtomicU64::new(0),
                peak_units: AtomicU64::new(0),
                probes: AtomicU64::new(0),
            }),
            limiter,
            batch_size: options.batch_size.max(1),
        }
    }

    /// Scan every line of `reader`. Bad lines are logged and skipped; only
    /// fatal errors end the run early.
    pub async fn run<R>(
        &self,
        reader: R,
        resolver: &dyn Resolver,
        progress: Option<&ProgressBar>,
    ) -> ScanResult<RunSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = RunSummary::default();
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            summary.lines += 1;
            if let Some(pb) = progress {
                pb.set_message(line.to_string());
            }

            if !self.scan_line(line, resolver).await? {
                summary.skipped_lines += 1;
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        summary.units = self.shared.units.load(Ordering::Relaxed);
        summary.probes = self.shared.probes.load(Ordering::Relaxed);
        summary.peak_units = self.shared.peak_units.load(Ordering::Relaxed);
        Ok(summary)
    }

    /// Classify and scan one line. Returns `false` when the line was dropped.
    pub async fn scan_line(&self, line: &str, resolver: &dyn Resolver) -> ScanResult<bool> {
        let target = match ScanTarget::classify(line, resolver).await {
            Ok(target) => target,
            Err(e) => {
                warn!(line, error = %e, "skipping target");
                return Ok(false);
            }
        };
        debug!(line, ?target, "classified target");

        match self.scan_target(target).await {
            Ok(()) => Ok(true),
            Err(e) if !e.is_fatal() => {
                warn!(line, error = %e, "skipping target");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn scan_target(&self, target: ScanTarget) -> ScanResult<()> {
        match target {
            ScanTarget::Domain(name) => self.scan_domain(&name).await,
            ScanTarget::SingleHost(ip) => self.scan_network(single_host_network(ip)).await,
            ScanTarget::Cidr(network) => self.scan_network(network).await,
            ScanTarget::IpRange(start, end) => self.scan_range(start, end).await,
            ScanTarget::Endpoint(addr) => self.scan_endpoint(addr).await,
        }
    }

    async fn scan_network(&self, network: IpNetwork) -> ScanResult<()> {
        info!(%network, "scanning block");
        self.scan_cursor(EnumerationCursor::new(network)).await
    }

    async fn scan_range(&self, start: IpAddr, end: IpAddr) -> ScanResult<()> {
        info!(%start, %end, "scanning range");
        if let (IpAddr::V4(s), IpAddr::V4(e)) = (start, end) {
            let cursor = EnumerationCursor::for_ipv4_range(s, e)
                .ok_or(TargetError::InvertedRange(start, end))?;
            return self.scan_cursor(cursor).await;
        }

        let hosts: Vec<IpAddr> = ip_range_to_cidrs(start, end)?
            .into_iter()
            .map(|network| network.ip())
            .collect();
        for batch in hosts.chunks(self.batch_size) {
            self.scan_batch(batch).await?;
        }
        Ok(())
    }

    async fn scan_cursor(&self, mut cursor: EnumerationCursor) -> ScanResult<()> {
        loop {
            let batch = cursor.next_batch(self.batch_size);
            self.scan_batch(&batch.hosts).await?;
            if batch.completed {
                return Ok(());
            }
        }
    }

    /// Dispatch one batch and wait until every probe it produced has run.
    async fn scan_batch(&self, hosts: &[IpAddr]) -> ScanResult<()> {
        if hosts.is_empty() {
            return Ok(());
        }

        let group = BatchGroup::new();
        let mut units = Vec::with_capacity(hosts.len());
        for &ip in hosts {
            let permit = self.limiter.acquire().await?;
            units.push(spawn_unit(
                Arc::clone(&self.shared),
                url_host(ip),
                None,
                Some(group.token()),
                permit,
            ));
        }

        join_units(units).await?;
        group.wait().await;
        Ok(())
    }

    /// One unit per template; the host in every URL is the domain name.
    async fn scan_domain(&self, name: &str) -> ScanResult<()> {
        info!(domain = name, "scanning domain");
        let templates = self.shared.tasks.templates().to_vec();
        let mut units = Vec::with_capacity(templates.len());
        for template in templates {
            let permit = self.limiter.acquire().await?;
            units.push(spawn_unit(
                Arc::clone(&self.shared),
                name.to_string(),
                Some(vec![template]),
                None,
                permit,
            ));
        }
        join_units(units).await
    }

    async fn scan_endpoint(&self, addr: SocketAddr) -> ScanResult<()> {
        info!(%addr, "scanning endpoint");
        let port = Port::new(addr.port())
            .ok_or_else(|| TargetError::Malformed(addr.to_string()))?;
        let templates = self.shared.tasks.for_port(port);
        let permit = self.limiter.acquire().await?;
        let unit = spawn_unit(
            Arc::clone(&self.shared),
            url_host(addr.ip()),
            Some(templates),
            None,
            permit,
        );
        join_units(vec![unit]).await
    }
}

/// Start a dispatch unit holding `permit` until it finishes. `templates`
/// defaults to every configured template.
fn spawn_unit(
    shared: Arc<Shared>,
    host: String,
    templates: Option<Vec<ProbeTemplate>>,
    completion: Option<CompletionToken>,
    permit: OwnedSemaphorePermit,
) -> JoinHandle<ScanResult<()>> {
    tokio::spawn(async move {
        let _permit = permit;
        shared.units.fetch_add(1, Ordering::Relaxed);
        let active = shared.active_units.fetch_add(1, Ordering::SeqCst) + 1;
        shared.peak_units.fetch_max(active, Ordering::SeqCst);

        let templates = templates.as_deref().unwrap_or_else(|| shared.tasks.templates());
        let result = dispatch_host(&shared, &host, templates, completion).await;
        shared.active_units.fetch_sub(1, Ordering::SeqCst);
        result
    })
}

/// Enqueue the host's templates in order until they run out or the host
/// deadline passes.
async fn dispatch_host(
    shared: &Shared,
    host: &str,
    templates: &[ProbeTemplate],
    completion: Option<CompletionToken>,
) -> ScanResult<()> {
    let deadline = Instant::now() + shared.host_timeout;

    for (sent, template) in templates.iter().enumerate() {
        if Instant::now() >= deadline {
            debug!(host, sent, total = templates.len(), "host deadline reached");
            return Ok(());
        }

        let descriptor = template.resolve(host, &Local::now())?;
        let mut task = Task::new(descriptor);
        if let Some(token) = &completion {
            task = task.with_completion(token.clone());
        }

        match tokio::time::timeout_at(deadline, shared.pool.submit(task)).await {
            Ok(submitted) => submitted?,
            Err(_) => {
                debug!(host, sent, total = templates.len(), "host deadline reached while queueing");
                return Ok(());
            }
        }
        shared.probes.fetch_add(1, Ordering::Relaxed);
    }
    Ok(())
}

/// Wait for dispatch units, surfacing the first fatal error.
async fn join_units(units: Vec<JoinHandle<ScanResult<()>>>) -> ScanResult<()> {
    let mut first_error = None;
    for result in join_all(units).await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "dispatch failed");
                first_error.get_or_insert(e);
            }
            Err(e) => error!(error = %e, "dispatch unit panicked"),
        }
    }
    first_error.map_or(Ok(()), Err)
}
