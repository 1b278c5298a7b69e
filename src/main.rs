use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use consensus_cluster::cluster::Partition;
use consensus_cluster::consensus::{sweep_thresholds, threshold_range};
use consensus_cluster::consistency::aggregate_sweep;
use consensus_cluster::graph::{node_profiles, WeightedGraph};
use consensus_cluster::{
    edge_consistency, node_consistency, ConsensusConfig, ConsensusEngine, Louvain,
};

mod data;
mod storage;

#[derive(Parser, Debug)]
#[clap(
    name = "consensus-cluster",
    about = "Consensus clustering and edge/node consistency of weighted graphs"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0", global = true)]
    threads: usize,

    /// Verbose logging
    #[clap(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consensus partition at one threshold plus edge and node consistency
    Consistency {
        #[clap(flatten)]
        common: CommonArgs,

        /// Co-membership threshold for keeping an edge
        #[clap(long, default_value = "0.5")]
        threshold: f64,

        #[clap(flatten)]
        nodes: NodeFileArgs,
    },

    /// Consensus partitions over a range of thresholds
    Sweep {
        #[clap(flatten)]
        common: CommonArgs,

        /// Spacing of the thresholds, starting from 0
        #[clap(long, default_value = "0.1")]
        step: f64,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Path to the edge list
    edge_file: String,

    /// Output directory for results
    #[clap(long, default_value = "consensus_results")]
    output_dir: String,

    /// Seed partitions, one column per node (generated when absent)
    #[clap(long)]
    partitions_file: Option<String>,

    /// Field separator of the edge list
    #[clap(long, default_value = ",")]
    separator: char,

    #[clap(long, default_value = "Source")]
    source_col: String,

    #[clap(long, default_value = "Target")]
    target_col: String,

    #[clap(long, default_value = "Weight")]
    weight_col: String,

    /// Candidate partitions generated per round
    #[clap(long, default_value = "100")]
    partitions: usize,

    /// Give up after this many rounds (0 = never)
    #[clap(long, default_value = "100")]
    max_iterations: usize,

    /// Base seed for every clustering run
    #[clap(long, default_value = "0")]
    seed: u64,

    /// Modularity resolution
    #[clap(long, default_value = "1.0")]
    resolution: f64,

    /// Consistency cutoffs for the neighbor fractions
    #[clap(long, value_delimiter = ',', default_value = "0.8,0.9,1.0")]
    cutoffs: Vec<f64>,

    /// Keep the original edge weights instead of the co-membership values
    #[clap(long)]
    no_reweight: bool,
}

#[derive(Args, Debug)]
struct NodeFileArgs {
    /// Node attributes to join onto the node table
    #[clap(long)]
    node_file: Option<String>,

    /// Field separator of the node file
    #[clap(long, default_value = ",")]
    node_separator: char,

    /// Node ID column of the node file
    #[clap(long, default_value = "id")]
    id_col: String,
}

impl NodeFileArgs {
    fn load(&self) -> Result<Option<data::NodeAttributes>> {
        let path = match &self.node_file {
            Some(path) => path,
            None => return Ok(None),
        };
        if !self.node_separator.is_ascii() {
            return Err(anyhow!("node separator must be a single ASCII character"));
        }
        let attributes =
            data::load_node_attributes(path, self.node_separator as u8, &self.id_col)?;
        Ok(Some(attributes))
    }
}

impl CommonArgs {
    fn config(&self, threshold: f64) -> ConsensusConfig {
        let max_iterations = (self.max_iterations > 0).then_some(self.max_iterations);
        ConsensusConfig::new(threshold, self.partitions, max_iterations, self.seed)
            .with_cutoffs(self.cutoffs.clone())
            .with_resolution(self.resolution)
            .with_reweight(!self.no_reweight)
    }

    fn load_graph(&self) -> Result<WeightedGraph> {
        if !self.separator.is_ascii() {
            return Err(anyhow!("separator must be a single ASCII character"));
        }
        let format = data::EdgeListFormat {
            separator: self.separator as u8,
            source_col: self.source_col.clone(),
            target_col: self.target_col.clone(),
            weight_col: self.weight_col.clone(),
        };
        data::load_edge_list(&self.edge_file, &format)
    }

    fn seeds(
        &self,
        engine: &ConsensusEngine<Louvain>,
        graph: &WeightedGraph,
    ) -> Result<Vec<Partition>> {
        match &self.partitions_file {
            Some(path) => data::load_partitions(path, graph),
            None => {
                log::info!(
                    "Generating {} initial partitions",
                    engine.config().partition_count
                );
                Ok(engine.initial_partitions(graph)?)
            }
        }
    }
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
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    match args.command {
        Command::Consistency {
            common,
            threshold,
            nodes,
        } => run_consistency(&common, threshold, &nodes),
        Command::Sweep { common, step } => run_sweep(&common, step),
    }
}

fn run_consistency(args: &CommonArgs, threshold: f64, node_args: &NodeFileArgs) -> Result<()> {
    log::info!("Starting consensus clustering at threshold {:.3}", threshold);
    log::info!("Input: {}", args.edge_file);
    log::info!("Output: {}", args.output_dir);

    let config = args.config(threshold);
    config.validate()?;
    let resolution = config.resolution;
    let engine = ConsensusEngine::new(Louvain::new().with_resolution(resolution), config);

    // 1. Load data
    let graph = args.load_graph()?;
    let attributes = node_args.load()?;

    // 2. Candidate partitions
    let seeds = args.seeds(&engine, &graph)?;

    // 3. Consensus partition
    let outcome = engine.consensus_partition(&graph, &seeds)?;
    log::info!(
        "Consensus reached after {} iterations with {} communities",
        outcome.iterations,
        outcome.partition.community_count()
    );

    // 4. Consistency
    let edges = edge_consistency(&graph, &outcome.matrix);
    let nodes = node_consistency(&graph, &edges, Some(engine.config().cutoffs.as_slice()))?;
    let profiles = node_profiles(&graph);

    // 5. Save results
    let results = storage::ConsistencyResults {
        graph: &graph,
        initial_partitions: &seeds,
        outcome: &outcome,
        threshold,
        edges: &edges,
        nodes: &nodes,
        profiles: &profiles,
        attributes: attributes.as_ref(),
    };
    storage::save_consistency_results(&results, &args.output_dir)?;

    log::info!("Analysis complete. Results saved to {}", args.output_dir);
    Ok(())
}

fn run_sweep(args: &CommonArgs, step: f64) -> Result<()> {
    let thresholds = threshold_range(step)?;
    log::info!("Starting threshold sweep over {} thresholds", thresholds.len());
    log::info!("Input: {}", args.edge_file);
    log::info!("Output: {}", args.output_dir);

    let config = args.config(0.0);
    config.validate()?;
    let resolution = config.resolution;
    let engine = ConsensusEngine::new(Louvain::new().with_resolution(resolution), config);

    let graph = args.load_graph()?;
    let seeds = args.seeds(&engine, &graph)?;

    let results = sweep_thresholds(
        engine.detector(),
        &graph,
        &seeds,
        &thresholds,
        engine.config(),
    )?;
    let converged = results.iter().filter(|r| r.converged()).count();
    log::info!("{} of {} thresholds converged", converged, results.len());

    let tables: Vec<_> = results.iter().filter_map(|r| r.nodes.clone()).collect();
    let sweep = aggregate_sweep(&tables)?;

    storage::save_sweep_results(&graph, &results, &sweep, &args.output_dir)?;

    log::info!("Sweep complete. Results saved to {}", args.output_dir);
    Ok(())
}
