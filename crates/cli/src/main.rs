use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Dataset, UserId};
use rand::Rng;
use server::{
    BuildOutcome, DataSources, HybridRecommender, InMemoryCache, RebuildSummary, RecommenderConfig,
    StatusReport, rebuild_in_background,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Media Recs - Hybrid Media Recommender
#[derive(Parser)]
#[command(name = "media-recs")]
#[command(about = "Hybrid collaborative + content media recommender", long_about = None)]
struct Cli {
    /// Directory containing interactions.dat, media.dat and history.dat
    #[arg(short, long, env = "DATA_DIR", default_value = "data/sample")]
    data_dir: PathBuf,

    #[command(flatten)]
    config: RecommenderConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Show why each item was recommended
        #[arg(long)]
        explain: bool,
    },

    /// Find items with similar content
    Similar {
        #[arg(long)]
        media_id: String,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Rebuild both models and print the summary
    Rebuild {
        /// Print the raw JSON summary
        #[arg(long)]
        json: bool,
    },

    /// Show model status after a build
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    cli.config.validate().context("Invalid recommender configuration")?;

    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let dataset = Arc::new(
        Dataset::load_from_files(&cli.data_dir)
            .with_context(|| format!("Failed to load dataset from {}", cli.data_dir.display()))?,
    );
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    let recommender = Arc::new(HybridRecommender::new(
        cli.config,
        DataSources::from_dataset(dataset.clone()),
        Arc::new(InMemoryCache::new()),
    ));
    let summary = rebuild_in_background(recommender.clone()).await?;

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
        } => handle_recommend(&recommender, &dataset, &user_id, limit, explain),
        Commands::Similar { media_id, limit } => handle_similar(&recommender, &dataset, &media_id, limit),
        Commands::Rebuild { json } => print_summary(&summary, json),
        Commands::Status { json } => print_status(&recommender.get_status(), json),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(recommender, &dataset, requests, concurrent).await,
    }
}

/// Handle the 'recommend' command
fn handle_recommend(
    recommender: &HybridRecommender,
    dataset: &Dataset,
    user_id: &str,
    limit: usize,
    explain: bool,
) -> Result<()> {
    let response = recommender.get_recommendations(user_id, limit);
    if !response.model_ready {
        println!("{}", "No model is ready; showing popular items".yellow());
    }

    println!("{}", format!("Recommendations for {}:", response.user_id).bold().blue());
    for (rank, rec) in response.recommendations.iter().enumerate() {
        let title = dataset
            .get_media(&rec.media_id)
            .map(|m| m.title.as_str())
            .unwrap_or("<unknown>");
        println!(
            "{}. {} [{}] - Score: {:.4}",
            (rank + 1).to_string().green(),
            title,
            rec.media_id,
            rec.score
        );
        if explain {
            println!("   Reason: {}", rec.reason.to_string().cyan());
        }
    }
    if response.count == 0 {
        println!("  (nothing to recommend)");
    }
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(recommender: &HybridRecommender, dataset: &Dataset, media_id: &str, limit: usize) -> Result<()> {
    let reference = dataset
        .get_media(media_id)
        .ok_or_else(|| anyhow!("Media item {} not found", media_id))?;

    let response = recommender.get_similar_items(media_id, limit);
    println!("{}", format!("Similar to '{}':", reference.title).bold().blue());
    for (rank, rec) in response.similar.iter().enumerate() {
        let (title, genres) = dataset
            .get_media(&rec.media_id)
            .map(|m| (m.title.as_str(), m.genres.as_str()))
            .unwrap_or(("<unknown>", ""));
        println!(
            "{}. {} [{}] ({}) - Similarity: {:.4}",
            (rank + 1).to_string().green(),
            title,
            rec.media_id,
            genres,
            rec.score
        );
    }
    Ok(())
}

fn outcome_label(outcome: &BuildOutcome) -> String {
    match outcome {
        BuildOutcome::Rebuilt => "rebuilt".green().to_string(),
        BuildOutcome::Empty => "empty".yellow().to_string(),
        BuildOutcome::KeptPrevious { error } => format!("{} ({})", "kept previous".red(), error),
    }
}

fn print_summary(summary: &RebuildSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{}", format!("Rebuild (generation {})", summary.generation).bold().blue());
    println!(
        "{}Collaborative: {} - {} users x {} items",
        "• ".green(),
        outcome_label(&summary.collaborative.outcome),
        summary.collaborative.users,
        summary.collaborative.items
    );
    println!(
        "{}Content-based: {} - {} items, {} features",
        "• ".green(),
        outcome_label(&summary.content_based.outcome),
        summary.content_based.items,
        summary.content_based.features
    );
    println!(
        "{}Loaded {} interactions, {} media items in {:.3}s",
        "• ".cyan(),
        summary.interactions_loaded,
        summary.media_items_loaded,
        summary.build_time_seconds
    );
    Ok(())
}

fn print_status(status: &StatusReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    let ready = if status.ready { "ready".green() } else { "not ready".red() };
    println!("{}", format!("Recommender status: {}", ready).bold());
    println!(
        "{}Collaborative: {:?} ({} users, {} items, {} interactions)",
        "• ".green(),
        status.collaborative.state,
        status.collaborative.users,
        status.collaborative.items,
        status.collaborative.interactions
    );
    println!(
        "{}Content-based: {:?} ({} items, {} features)",
        "• ".green(),
        status.content_based.state,
        status.content_based.items,
        status.content_based.features
    );
    println!(
        "{}Weights: collaborative {:.2}, content {:.2}",
        "• ".cyan(),
        status.weights.collaborative,
        status.weights.content_based
    );
    if let Some(at) = &status.last_rebuild {
        println!(
            "{}Last rebuild: {} ({:.3}s)",
            "• ".cyan(),
            at,
            status.rebuild_duration_seconds.unwrap_or_default()
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    recommender: Arc<HybridRecommender>,
    dataset: &Dataset,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let known_users = dataset.user_ids();
    if known_users.is_empty() {
        return Err(anyhow!("Dataset has no users to benchmark with"));
    }

    let mut rng = rand::rng();
    let user_ids: Vec<UserId> = (0..requests)
        .map(|_| known_users[rng.random_range(0..known_users.len())].clone())
        .collect();

    let wall = Instant::now();
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);

    for batch in user_ids.chunks(concurrent.max(1)) {
        let mut handles = Vec::with_capacity(batch.len());
        for user in batch.iter().cloned() {
            let recommender = recommender.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                recommender.get_recommendations(&user, 20);
                start.elapsed()
            }));
        }
        for handle in handles {
            timings.push(handle.await?);
        }
    }
    let total_time = wall.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }

    timings.sort();
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", timings.len(), concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}
