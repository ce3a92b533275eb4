//! Recommender service process.
//!
//! Loads a dataset snapshot, builds the first model generation, then keeps
//! the models fresh on a timer until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::Dataset;
use server::{
    DataSources, HybridRecommender, InMemoryCache, RebuildScheduler, RecommenderConfig,
    rebuild_in_background,
};

#[derive(Parser)]
#[command(name = "recommender-server")]
#[command(about = "Hybrid media recommender service", long_about = None)]
struct Args {
    /// Directory containing interactions.dat, media.dat and history.dat
    #[arg(short, long, env = "DATA_DIR", default_value = "data/sample")]
    data_dir: PathBuf,

    #[command(flatten)]
    config: RecommenderConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    args.config.validate().context("Invalid recommender configuration")?;
    info!("Starting recommender service with {:?}", args.config);

    let start = Instant::now();
    let dataset = Dataset::load_from_files(&args.data_dir)
        .with_context(|| format!("Failed to load dataset from {}", args.data_dir.display()))?;
    let (interactions, media, users) = dataset.counts();
    info!(
        "Loaded {} interactions, {} media items, {} users with history in {:?}",
        interactions,
        media,
        users,
        start.elapsed()
    );

    let interval = args.config.rebuild_interval();
    let recommender = Arc::new(HybridRecommender::new(
        args.config,
        DataSources::from_dataset(Arc::new(dataset)),
        Arc::new(InMemoryCache::new()),
    ));

    let summary = rebuild_in_background(recommender.clone()).await?;
    if !recommender.is_ready() {
        warn!("No model is ready after the initial build; serving popularity only");
    }
    info!(
        "Initial build: collaborative ready={}, content ready={} ({:.3}s)",
        summary.collaborative.ready, summary.content_based.ready, summary.build_time_seconds
    );

    let scheduler = RebuildScheduler::spawn(recommender.clone(), interval);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    scheduler.shutdown().await;
    let status = recommender.get_status();
    info!("Stopped at generation {}", status.generation);
    Ok(())
}
