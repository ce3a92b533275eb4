use data_loader::Dataset;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/sample");

    println!("Loading dataset from {}...\n", data_dir.display());

    let start = Instant::now();
    let dataset = Dataset::load_from_files(data_dir)
        .expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (interactions, media, users_with_history) = dataset.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Interactions: {}", interactions);
    println!("Media items: {}", media);
    println!("Users with history: {}", users_with_history);
    println!("\nPerformance: {:.0} interactions/second",
             interactions as f64 / elapsed.as_secs_f64());
}
