//! Headless fleet match runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one match, streaming snapshots as JSON lines
//! cargo run -p fleet_headless -- run --config skirmish_1v1 --snapshot-interval 300
//!
//! # Run a batch of seeds in parallel
//! cargo run -p fleet_headless -- batch --config free_for_all --count 50 --output results/
//!
//! # Verify determinism
//! cargo run -p fleet_headless -- verify --seed 12345 --runs 5
//!
//! # Measure tick throughput
//! cargo run -p fleet_headless -- benchmark --ticks 36000
//! ```
//!
//! Snapshots and summaries go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleet_core::world::GameWorld;
use fleet_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    MatchConfig, MatchRunner,
};

#[derive(Parser)]
#[command(name = "fleet_headless")]
#[command(about = "Headless fleet match runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Run {
        /// Preset name or RON file
        #[arg(short, long, default_value = "skirmish_1v1")]
        config: String,

        /// Override the world seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the tick limit
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Print a snapshot every N ticks (0 = only the summary)
        #[arg(long)]
        snapshot_interval: Option<u64>,
    },

    /// Run a batch of seeds in parallel
    Batch {
        /// Preset name or RON file
        #[arg(short, long, default_value = "skirmish_1v1")]
        config: String,

        /// Number of matches to run
        #[arg(short = 'n', long, default_value = "20")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Preset name or RON file
        #[arg(short, long, default_value = "skirmish_1v1")]
        config: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value = "6000")]
        max_ticks: u64,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Preset name or RON file
        #[arg(short, long, default_value = "free_for_all")]
        config: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON
    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            config,
            seed,
            max_ticks,
            snapshot_interval,
        }) => cmd_run(&config, seed, max_ticks, snapshot_interval),
        Some(Commands::Batch {
            config,
            count,
            parallel,
            output,
            seed,
        }) => cmd_batch(&config, count, parallel, output, seed),
        Some(Commands::Verify {
            config,
            seed,
            runs,
            max_ticks,
        }) => cmd_verify(&config, seed, runs, max_ticks),
        Some(Commands::Benchmark { ticks, config }) => cmd_benchmark(&config, ticks),
        None => cmd_run("skirmish_1v1", None, None, None),
    }
}

fn load_config(name_or_path: &str) -> MatchConfig {
    match MatchConfig::resolve(name_or_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load match config: {e}");
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!("Failed to serialize output: {}", e),
    }
}

/// Play one match
fn cmd_run(
    config: &str,
    seed: Option<u64>,
    max_ticks: Option<u64>,
    snapshot_interval: Option<u64>,
) {
    let mut config = load_config(config);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(max_ticks) = max_ticks {
        config = config.with_max_ticks(max_ticks);
    }
    if let Some(interval) = snapshot_interval {
        config.snapshot_interval = interval;
    }

    let runner = match MatchRunner::new(config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to create world: {e}");
            std::process::exit(1);
        }
    };
    let summary = runner.run(|snapshot| print_json(snapshot));
    print_json(&summary);
}

/// Run a batch of seeds
fn cmd_batch(config: &str, count: u32, parallel: u32, output: PathBuf, seed: u64) {
    let batch = BatchConfig::new(load_config(config), count)
        .with_parallelism(parallel)
        .with_output(output.clone())
        .with_seed(seed);

    let results = run_batch(batch);
    let path = output.join("batch.json");
    if let Err(e) = results.save(&path) {
        eprintln!("Failed to save results: {e}");
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches: {}", summary.total_matches);
    eprintln!("Victories: {}", summary.victories);
    eprintln!("Defeats: {}", summary.defeats);
    eprintln!("Draws: {}", summary.draws);
    eprintln!("Average ticks: {:.0}", summary.avg_ticks);
    eprintln!("Errors: {}", results.errors.len());
    eprintln!("Saved to {}", path.display());
}

/// Verify determinism
fn cmd_verify(config: &str, seed: u64, runs: u32, max_ticks: u64) {
    let config = load_config(config).with_seed(seed).with_max_ticks(max_ticks);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        config.name,
        seed,
        runs
    );

    if verify_determinism(&config, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Measure raw tick throughput with AI on every side
fn cmd_benchmark(config: &str, ticks: u64) {
    let config = load_config(config);
    tracing::info!("Running {} tick benchmark on '{}'", ticks, config.name);

    let mut world = match GameWorld::new(&config.world) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Failed to create world: {e}");
            std::process::exit(1);
        }
    };
    eprintln!("Starting benchmark with {} ships", world.ships().len());

    // Warmup
    for _ in 0..100 {
        world.update(config.step_ms);
    }

    let start = Instant::now();
    for _ in 0..ticks {
        world.update(config.step_ms);
    }
    let elapsed = start.elapsed();

    let tps = ticks as f64 / elapsed.as_secs_f64();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {ticks}");
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {tps:.1}");
    eprintln!("ms/tick: {:.4}", elapsed.as_millis() as f64 / ticks.max(1) as f64);
    eprintln!("Final ships: {}", world.ships().len());
    eprintln!("Phase: {:?}", world.phase());
    eprintln!("State hash: {:016x}", world.state_hash());
}
