use anyhow::{Context, Result};
use clap::Parser;
use multipartite_louvain::storage::{self, RunReport};
use multipartite_louvain::{summarize_communities, IncomingWeights, Louvain, LouvainConfig};

#[derive(Parser, Debug)]
#[clap(
    name = "multipartite-louvain",
    about = "Cross-layer community detection on multipartite directed graphs"
)]
struct Cli {
    /// Path to input graph (JSON)
    #[clap(long)]
    input: String,

    /// Output directory for results
    #[clap(long, default_value = "community_results")]
    output_dir: String,

    /// Resolution; larger values favor smaller communities
    #[clap(long, default_value = "1.0")]
    resolution: f64,

    /// Per-type penalty, comma separated (default: no penalty)
    #[clap(long, value_delimiter = ',')]
    beta: Option<Vec<f64>>,

    /// Random seed
    #[clap(long, default_value = "42")]
    seed: u64,

    /// Edge attribute holding the weight
    #[clap(long, default_value = "weight")]
    weight_key: String,

    /// Node attribute holding the type vector or layer index
    #[clap(long, default_value = "type")]
    nodetype_key: String,

    /// Dendrogram level to report (default: the last one)
    #[clap(long)]
    level: Option<usize>,

    /// Stop after this many levels
    #[clap(long)]
    max_levels: Option<usize>,

    /// Aggregate incoming neighbor weights the historical way
    #[clap(long)]
    legacy_incoming: bool,

    /// Number of worker threads for statistics (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = LouvainConfig {
        resolution: args.resolution,
        beta_penalty: args.beta,
        seed: args.seed,
        weight_key: args.weight_key,
        nodetype_key: args.nodetype_key,
        incoming: if args.legacy_incoming {
            IncomingWeights::Legacy
        } else {
            IncomingWeights::Accumulate
        },
        max_levels: args.max_levels,
        max_sweeps: None,
    };

    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);

    // 1. Load graph
    let graph = storage::load_graph(&args.input, &config.weight_key, &config.nodetype_key)
        .with_context(|| format!("failed to load graph from {}", args.input))?;

    // 2. Build the dendrogram
    let louvain = Louvain::from_config(config);
    let dendrogram = louvain.generate_dendrogram(&graph.graph, None)?;
    log::info!("Dendrogram has {} levels", dendrogram.len());

    // 3. Flatten the requested level
    let level = args.level.unwrap_or(dendrogram.len().saturating_sub(1));
    let partition = dendrogram
        .partition_at_level(level)
        .with_context(|| format!("cannot flatten level {level}"))?;

    // 4. Community statistics
    let communities = summarize_communities(&graph.graph, &partition)?;
    log::info!("Found {} communities at level {}", communities.len(), level);

    // 5. Save results
    let report = RunReport {
        config: louvain.config(),
        dendrogram: &dendrogram,
        partition: &partition,
        level,
        communities: &communities,
    };
    storage::save_results(&report, &graph, &args.output_dir)
        .with_context(|| format!("failed to save results to {}", args.output_dir))?;

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
