//! The `run` command: a multi-threaded workload against a sprite pool.

use crate::sprite::{Sprite, SpriteTotals};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use cycle_pool::{Pool, PoolConfig, PoolStats};
use log::{info, trace};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// TOML file with the pool configuration
    #[clap(long)]
    config: Option<PathBuf>,

    /// Number of sprites created up front
    #[clap(long)]
    resources: Option<usize>,

    /// Create sprites on demand instead of waiting
    #[clap(long)]
    growable: bool,

    /// Pause between updater passes, in milliseconds
    #[clap(long)]
    update_interval_ms: Option<u64>,

    /// Number of worker threads
    #[clap(long, default_value_t = 4)]
    workers: usize,

    /// Acquire/release rounds per worker
    #[clap(long, default_value_t = 100)]
    iterations: usize,

    /// How long each worker holds a sprite, in milliseconds
    #[clap(long, default_value_t = 1)]
    hold_ms: u64,

    /// Sprites left checked out at the end, to be reclaimed by shutdown
    #[clap(long, default_value_t = 0)]
    leak: usize,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunReport {
    config: PoolConfig,
    elapsed_ms: u64,
    stats: PoolStats,
    force_released: usize,
    destroyed: usize,
    sprites_spawned: u64,
    frames: u64,
    balanced: bool,
}

/// Build the pool configuration from the file and the command-line overrides
fn load_config(args: &RunArgs) -> Result<PoolConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PoolConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => PoolConfig::default(),
    };

    if let Some(resources) = args.resources {
        config.initial_size = resources;
    }
    if args.growable {
        config.growable = true;
    }
    if let Some(ms) = args.update_interval_ms {
        config.update_interval = Duration::from_millis(ms);
    }

    Ok(config)
}

/// Implementation of the run command
pub fn execute(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    if !config.growable && config.initial_size == 0 {
        return Err(anyhow!("a fixed pool needs at least one resource"));
    }

    let totals = Arc::new(SpriteTotals::default());
    let factory_totals = Arc::clone(&totals);
    let pool = Pool::with_factory(config.clone(), move || {
        Sprite::spawn(Arc::clone(&factory_totals))
    })?;

    info!(
        "Running {} workers x {} iterations",
        args.workers, args.iterations
    );

    let hold = Duration::from_millis(args.hold_ms);
    let start = Instant::now();

    thread::scope(|s| -> Result<()> {
        let workers: Vec<_> = (0..args.workers)
            .map(|_| {
                s.spawn(|| -> Result<()> {
                    for _ in 0..args.iterations {
                        let sprite = pool.lease()?;
                        thread::sleep(hold);
                        trace!(
                            "{} reached frame {}",
                            sprite.handle().id(),
                            sprite.frame()
                        );
                        sprite.release()?;
                    }
                    Ok(())
                })
            })
            .collect();

        for worker in workers {
            worker
                .join()
                .map_err(|_| anyhow!("worker thread panicked"))??;
        }
        Ok(())
    })?;

    let leaked = (0..args.leak)
        .map(|_| pool.try_acquire())
        .collect::<Result<Vec<_>, _>>()
        .context("could not check out sprites to leak")?;
    trace!("Leaving {} sprites checked out", leaked.len());

    let elapsed = start.elapsed();
    let shutdown = pool.shutdown();
    let stats = pool.stats();

    let report = RunReport {
        config,
        elapsed_ms: elapsed.as_millis() as u64,
        balanced: stats.is_balanced()
            && totals.shown.load(Ordering::Relaxed) == totals.hidden.load(Ordering::Relaxed),
        stats,
        force_released: shutdown.force_released,
        destroyed: shutdown.destroyed,
        sprites_spawned: totals.spawned.load(Ordering::Relaxed),
        frames: totals.frames.load(Ordering::Relaxed),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    let stats = &report.stats;
    println!(
        "Pool: {} with {} initial sprites",
        if report.config.growable { "growable" } else { "fixed" },
        report.config.initial_size
    );
    println!("Elapsed: {}ms", report.elapsed_ms);
    println!("Sprites spawned: {}", report.sprites_spawned);
    println!("Acquired: {}", stats.acquired);
    println!("Released: {}", stats.released);
    println!("Waited: {}", stats.waits);
    println!("Force-released at shutdown: {}", report.force_released);
    println!(
        "Updater: {} passes, {} frames, {} failures",
        stats.update_passes, report.frames, stats.update_failures
    );
    println!(
        "Balanced: {}",
        if report.balanced { "yes" } else { "NO" }
    );
}
