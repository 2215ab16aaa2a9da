use anyhow::{Context, Result};
use clap::Parser;
use iptv_scan::cli::{self, Args};
use iptv_scan::config::{default_settings_path, ScanSettings};
use iptv_scan::output::{self, ResultSink, SinkOptions};
use iptv_scan::probe::{build_client, ClientOptions, Prober};
use iptv_scan::resolve::DnsResolver;
use iptv_scan::scanner::{GenerationLimiter, ProbeExecutor, ScanOptions, Scanner, WorkerPool};
use iptv_scan::verify::Verifier;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_settings_path()?,
    };
    let mut settings = ScanSettings::load_from(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    if let Some(targets) = &args.targets {
        settings.cidr_file = targets.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level(settings.log_enabled))),
        )
        .init();

    if let Err(e) = run(&args, settings).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: &Args, settings: ScanSettings) -> Result<()> {
    let started = Instant::now();
    let tasks = settings.task_source()?;
    if tasks.is_empty() {
        output::print_warning("no port/path templates configured; only endpoint lines will be probed");
    }
    if !args.quiet {
        println!("Scan started: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        output::print_scan_header(&settings, &settings.cidr_file, tasks.len());
    }

    let client = build_client(&ClientOptions {
        timeout: settings.timeout(),
        headers: settings.header_map()?,
    })?;
    let work_dir = std::env::current_dir().context("resolving the working directory")?;

    let (sink, results) = ResultSink::open(
        &settings.successful_ips_file,
        settings.file_buffer_size,
        SinkOptions {
            outputs: settings.outputs,
            echo: !settings.log_enabled && !args.quiet,
        },
    )
    .await
    .with_context(|| format!("opening {}", settings.successful_ips_file.display()))?;

    let concurrency = settings.max_concurrent_requests;
    let executor = Arc::new(ProbeExecutor::new(
        Prober::new(client.clone(), settings.download_ts),
        Verifier::new(client, settings.download_threshold(), &work_dir),
        results,
    ));
    let pool = WorkerPool::start(concurrency, settings.queue_capacity(), executor);
    let scanner = Scanner::new(
        tasks,
        pool.handle(),
        GenerationLimiter::new(concurrency),
        ScanOptions {
            batch_size: concurrency,
            host_timeout: settings.timeout(),
        },
    );

    let progress = if args.progress {
        Some(cli::progress_bar(count_targets(&settings.cidr_file).await?))
    } else {
        None
    };

    let file = tokio::fs::File::open(&settings.cidr_file)
        .await
        .with_context(|| format!("opening target file {}", settings.cidr_file.display()))?;
    let resolver = DnsResolver::new();
    let outcome = scanner
        .run(BufReader::new(file), &resolver, progress.as_ref())
        .await;

    drop(scanner);
    pool.join().await;
    let found = sink.finish().await;
    match output::sweep_artifacts(&work_dir).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, "removed leftover artifacts"),
        Err(e) => warn!(error = %e, "artifact sweep failed"),
    }
    if let Some(pb) = &progress {
        pb.finish_with_message("done");
    }

    let summary = outcome?;
    if !args.quiet {
        output::print_summary(&summary, found, started.elapsed().as_secs_f64());
        println!("Scan finished: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        println!("Results written to {}", settings.successful_ips_file.display());
    }
    Ok(())
}

/// Lines the scanner will act on, for the progress bar length.
async fn count_targets(path: &Path) -> Result<u64> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening target file {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut total = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            total += 1;
        }
    }
    Ok(total)
}
