//! Humanized piano performer (pianola-perf) - Main entry point
//!
//! Reads a JSON score, checks it is physically playable, schedules a
//! humanized performance, optionally preloads the samples it needs, and
//! prints the resulting plans and voices as JSON on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pianola_common::config::{default_config_path, SamplesFolderResolver};
use pianola_common::score::parse_score;
use pianola_perf::config::PerformanceConfig;
use pianola_perf::humanize::{Performance, PerformanceRng, PerformanceScheduler};
use pianola_perf::samples::{
    preload_manifest, render_voices, DecodePool, DirectorySource, Preloader, RenderedPerformance,
    SampleBank, SymphoniaDecoder,
};

/// Command-line arguments for pianola-perf
#[derive(Parser, Debug)]
#[command(name = "pianola-perf")]
#[command(about = "Humanized piano performance scheduler")]
#[command(version)]
struct Args {
    /// JSON score file
    #[arg(short, long)]
    score: PathBuf,

    /// TOML config file (defaults to <config dir>/pianola/pianola-perf.toml)
    #[arg(short, long, env = "PIANOLA_CONFIG")]
    config: Option<PathBuf>,

    /// Folder containing sample files
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Seed for a reproducible performance
    #[arg(long, env = "PIANOLA_SEED")]
    seed: Option<u64>,

    /// Playback-clock time of the performance start (seconds)
    #[arg(long)]
    start: Option<f64>,

    /// Fetch and decode the samples the score needs
    #[arg(long)]
    preload: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    performance: &'a Performance,
    voices: RenderedPerformance,
    missing_samples: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path("pianola-perf"));
    let config = match &config_path {
        Some(path) => PerformanceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PerformanceConfig::default(),
    };

    // Initialize tracing
    let default_filter = format!(
        "pianola_perf={0},pianola_common={0}",
        config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting pianola-perf");
    if let Some(path) = config_path.as_ref().filter(|p| !p.exists()) {
        info!("No config file at {}; using defaults", path.display());
    }

    let score_text = tokio::fs::read_to_string(&args.score)
        .await
        .with_context(|| format!("Failed to read score {}", args.score.display()))?;
    let score = parse_score(&score_text).context("Failed to parse score")?;
    info!("Loaded {} score events from {}", score.len(), args.score.display());

    let (perform_rng, mut voice_rng) = match args.seed {
        Some(seed) => (
            PerformanceRng::seeded(seed),
            PerformanceRng::seeded(seed.wrapping_add(1)),
        ),
        None => (PerformanceRng::from_entropy(), PerformanceRng::from_entropy()),
    };

    // Validation happens here, before any sample work
    let scheduler = PerformanceScheduler::new(config.humanize.clone());
    let start_time = args.start.unwrap_or(config.start_delay);
    let performance = scheduler
        .perform(&score, start_time, perform_rng)
        .context("Score cannot be performed")?;

    let bank = if args.preload {
        Some(preload(&args, &config, &score).await?)
    } else {
        None
    };

    let voices = render_voices(&performance, &config.humanize, bank.as_ref(), &mut voice_rng);

    let output = Output {
        performance: &performance,
        voices,
        missing_samples: bank.map(|b| b.missing().to_vec()).unwrap_or_default(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize performance")?
    );

    Ok(())
}

async fn preload(
    args: &Args,
    config: &PerformanceConfig,
    score: &[pianola_common::ScoreEvent],
) -> Result<SampleBank> {
    let folder = SamplesFolderResolver::new()
        .with_cli_arg(args.samples.clone())
        .with_toml_value(config.samples_folder.clone())
        .resolve();
    info!("Samples folder: {}", folder.display());

    let decoder = Arc::new(SymphoniaDecoder::new(config.output_sample_rate));
    let pool = DecodePool::new(config.decode_workers, decoder)
        .context("Failed to start decode pool")?;
    let source = DirectorySource::new(folder);

    let manifest = preload_manifest(score, &config.humanize.voicing);
    let bank = Preloader::new(&pool, &source)
        .load(&manifest, |done, total, file| {
            info!("Loaded {}/{}: {}", done, total, file);
        })
        .await;

    pool.shutdown().await;
    Ok(bank)
}
