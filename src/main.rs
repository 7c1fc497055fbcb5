//! Binary entrypoint for Oceanguard.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use humantime::parse_rfc3339;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use oceanguard::config::Configuration;
use oceanguard::detection::DetectionEventFactory;
use oceanguard::events::{DetectionTick, OperatorCommand};
use oceanguard::tasks::monitor::Monitor;
use oceanguard::tasks::{console, scheduler};
use oceanguard::timefmt::format_timestamp;

#[derive(Debug, Parser)]
#[command(
    name = "oceanguard",
    version,
    about = "Simulated maritime-surveillance monitoring service"
)]
struct Args {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Deterministic RNG seed for detections and timer delays
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Fabricate COUNT detections and print them without launching the service
    #[arg(long = "detection-dry-run", value_name = "COUNT")]
    detection_dry_run: Option<usize>,

    /// Freeze dry-run timestamps at this RFC 3339 instant
    #[arg(long, value_name = "RFC3339")]
    now: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?
        .validated()
        .context("invalid configuration values")?;

    if let Some(count) = args.detection_dry_run {
        let now = match args.now.as_deref() {
            Some(ts) => {
                DateTime::<Local>::from(parse_rfc3339(ts).context("failed to parse --now")?)
            }
            None => Local::now(),
        };
        run_detection_dry_run(&cfg, count, now, args.seed);
        return Ok(());
    }

    // Channels (small/bounded)
    let (tick_tx, tick_rx) = mpsc::channel::<DetectionTick>(8); // Scheduler -> Monitor
    let (cmd_tx, cmd_rx) = mpsc::channel::<OperatorCommand>(16); // Console -> Monitor

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let monitor = Monitor::new(&cfg, args.seed);
    let snapshots = monitor.subscribe();

    // Operator input; EOF doubles as a shutdown request.
    if std::io::stdin().is_terminal() {
        console::spawn_stdin_operator(cmd_tx, cancel.clone());
    } else {
        tracing::debug!("stdin is not a terminal; skipping operator console");
        drop(cmd_tx);
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let scheduler_cfg = cfg.scheduler.clone();
        let cancel = cancel.clone();
        let seed = args.seed;
        async move {
            scheduler::run(scheduler_cfg, seed, tick_tx, cancel)
                .await
                .context("scheduler task failed")
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            monitor
                .run(tick_rx, cmd_rx, cancel)
                .await
                .context("monitor task failed")
        }
    });

    tasks.spawn({
        let catalog = cfg.vessel_catalog.clone();
        let cancel = cancel.clone();
        async move {
            console::run_render(snapshots, catalog, cancel)
                .await
                .context("render task failed")
        }
    });

    tracing::info!(catalog = cfg.vessel_catalog.len(), "live monitoring active");

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

fn run_detection_dry_run(
    cfg: &Configuration,
    count: usize,
    now: DateTime<Local>,
    seed: Option<u64>,
) {
    println!(
        "# detection dry run\n# catalog: {} images\n# now: {}\n# seed: {}\n",
        cfg.vessel_catalog.len(),
        format_timestamp(&now),
        seed.map_or_else(|| "(random)".to_string(), |s| s.to_string())
    );

    let mut factory = DetectionEventFactory::new(&cfg.detection, cfg.vessel_catalog.len(), 0, seed);
    for i in 1..=count {
        let event = factory.create(now);
        let image = cfg
            .vessel_catalog
            .get(event.image_index)
            .map(String::as_str)
            .unwrap_or("<missing>");
        println!(
            "  {:>4}: {} @ {}, {} ({})",
            i,
            image,
            event.coordinates.lat,
            event.coordinates.lng,
            format_timestamp(&event.timestamp)
        );
    }
}
