use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use topdag::random::RandomTreeGenerator;
use topdag::util::Timer;
use topdag::{
    dot, estimation, xml, CompressionConfig, Compressor, DebugInfo, Labels, Statistics,
};

#[derive(Parser, Debug)]
#[command(name = "topdag", about = "Top DAG tree compression")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compress an XML document into a Top DAG and report sizes.
    Compress {
        /// Input XML file.
        input: PathBuf,
        /// Use the RePair-aware constructor.
        #[arg(short = 'r', long)]
        repair: bool,
        /// Minimum per-round edge ratio for the RePair constructor.
        #[arg(short = 'm', long, default_value_t = 1.22)]
        min_ratio: f64,
        /// Write the decompressed tree back as XML for verification.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Append a tab-separated statistics row to this file.
        #[arg(long)]
        stats: Option<PathBuf>,
        /// Print per-round progress.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate a random tree; optionally write it out and compress it.
    Random {
        /// Tree size in edges.
        #[arg(short = 'n', long, default_value_t = 10)]
        size: usize,
        /// Number of distinct labels.
        #[arg(short = 'l', long, default_value_t = 2)]
        labels: usize,
        /// RNG seed.
        #[arg(short = 's', long, default_value_t = 12345678)]
        seed: u64,
        /// Output XML filename.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Dump tree (and DAG, with --construct) as DOT into this directory.
        #[arg(short = 'd', long)]
        dot: Option<PathBuf>,
        /// Construct the Top DAG and report its size.
        #[arg(short = 'c', long)]
        construct: bool,
        /// Print progress output.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Batch-evaluate compression over many random trees.
    Eval {
        /// Tree size in edges.
        #[arg(long, default_value_t = 1000)]
        size: usize,
        /// Number of trees to evaluate.
        #[arg(long, default_value_t = 100)]
        iterations: usize,
        /// Number of distinct labels.
        #[arg(long, default_value_t = 2)]
        labels: usize,
        /// Base RNG seed; per-iteration seeds derive from it.
        #[arg(long, default_value_t = 12345678)]
        seed: u64,
        /// Write per-run debug rows to this file.
        #[arg(long)]
        stats: Option<PathBuf>,
        /// Write per-round edge ratios to this file.
        #[arg(long)]
        edge_ratios: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            repair,
            min_ratio,
            output,
            stats,
            verbose,
        } => run_compress(input, repair, min_ratio, output, stats, verbose),
        Commands::Random {
            size,
            labels,
            seed,
            output,
            dot,
            construct,
            verbose,
        } => run_random(size, labels, seed, output, dot, construct, verbose),
        Commands::Eval {
            size,
            iterations,
            labels,
            seed,
            stats,
            edge_ratios,
        } => run_eval(size, iterations, labels, seed, stats, edge_ratios),
    }
}

fn run_compress(
    input: PathBuf,
    repair: bool,
    min_ratio: f64,
    output: Option<PathBuf>,
    stats: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut labels = Labels::new();
    let mut timer = Timer::new();
    let (tree, node_labels) = xml::parse_file(&input, &mut labels)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    let generation_duration = timer.get_and_reset();

    let orig_nodes = tree.num_nodes();
    let orig_edges = tree.num_edges();
    println!(
        "{}; height {}, avg depth {:.2}",
        tree.summary(),
        tree.height(),
        tree.avg_depth()
    );
    let succinct_bits = estimation::succinct_tree_bits(&tree, &labels, &node_labels);

    let compressor = Compressor::new(CompressionConfig {
        use_repair: repair,
        min_ratio,
        verbose,
    });
    let mut compressed = compressor
        .compress(tree, &node_labels)
        .context("compression failed")?;
    compressed.debug.generation_duration = generation_duration;

    let dag_nodes = compressed.dag.num_nodes();
    let dag_edges = compressed.dag.count_edges();
    println!(
        "Top tree has {} clusters ({} non-leaves); construction took {:.2}ms",
        compressed.top_tree.len(),
        compressed.top_tree.len() - orig_nodes,
        compressed.debug.merge_duration
    );
    println!(
        "Top dag has {} nodes ({:.1}%), {} edges ({:.1}% of original tree)",
        dag_nodes,
        (dag_nodes * 100) as f64 / orig_nodes as f64,
        dag_edges,
        (dag_edges * 100) as f64 / orig_edges.max(1) as f64
    );

    let dag_bits = estimation::dag_size_bits(&compressed.dag, &labels);
    println!(
        "Output needs {} bits ({} bytes), vs {} bytes for the succinct tree ({:.1}:1)",
        dag_bits,
        (dag_bits + 7) / 8,
        (succinct_bits + 7) / 8,
        succinct_bits as f64 / dag_bits.max(1) as f64
    );
    println!(
        "RESULT compressed={} succinct={} minRatio={} repair={} nodes={} origNodes={} \
         edges={} origEdges={} file={}",
        dag_bits,
        succinct_bits,
        min_ratio,
        repair,
        dag_nodes,
        orig_nodes,
        dag_edges,
        orig_edges,
        input.display()
    );

    if let Some(path) = output {
        let (restored, restored_labels) = compressor
            .decompress(&compressed.dag)
            .context("decompression failed")?;
        xml::write_tree_to_path(&restored, &labels, &restored_labels, &path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote decompressed tree to {}", path.display());
    }

    if let Some(path) = stats {
        let mut out = BufWriter::new(
            File::create(&path).with_context(|| format!("failed to open {}", path.display()))?,
        );
        DebugInfo::dump_header(&mut out)?;
        compressed.debug.dump(&mut out)?;
        out.flush()?;
    }
    Ok(())
}

fn run_random(
    size: usize,
    num_labels: usize,
    seed: u64,
    output: Option<PathBuf>,
    dot_dir: Option<PathBuf>,
    construct: bool,
    verbose: bool,
) -> Result<()> {
    let mut random = RandomTreeGenerator::new(ChaCha8Rng::seed_from_u64(seed));
    let mut timer = Timer::new();
    let tree = random.generate_tree(size);
    let mut labels = Labels::new();
    let node_labels = random.random_labels(tree.num_nodes(), num_labels, &mut labels);
    if verbose {
        println!("Generated {} in {:.2}ms", tree.summary(), timer.get_and_reset());
    }

    if let Some(path) = &output {
        xml::write_tree_to_path(&tree, &labels, &node_labels, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(dir) = &dot_dir {
        std::fs::create_dir_all(dir)?;
        dot::write_tree_dot_to_path(&tree, &labels, &node_labels, dir.join("tree.dot"))?;
    }

    if !construct {
        return Ok(());
    }

    let orig_edges = tree.num_edges();
    let compressor = Compressor::new(CompressionConfig {
        verbose,
        ..CompressionConfig::default()
    });
    let compressed = compressor.compress(tree, &node_labels)?;
    let edges = compressed.dag.count_edges();
    println!(
        "Top dag has {} nodes, {} edges ({:.1}% of original tree)",
        compressed.dag.num_nodes(),
        edges,
        (edges * 100) as f64 / orig_edges.max(1) as f64
    );
    if let Some(dir) = &dot_dir {
        dot::write_dag_dot_to_path(&compressed.dag, &labels, dir.join("topdag.dot"))?;
    }
    Ok(())
}

fn run_eval(
    size: usize,
    iterations: usize,
    num_labels: usize,
    seed: u64,
    stats_path: Option<PathBuf>,
    edge_ratio_path: Option<PathBuf>,
) -> Result<()> {
    println!(
        "Running {iterations} iterations with trees of {size} edges and {num_labels} labels"
    );
    let mut statistics = Statistics::new();
    if let Some(path) = &stats_path {
        statistics.write_debug_info_to(path)?;
    }
    if let Some(path) = &edge_ratio_path {
        statistics.write_edge_ratios_to(path)?;
    }

    // Per-iteration seeds derive deterministically from the parameters.
    let mut seeder = ChaCha8Rng::seed_from_u64(
        seed ^ (size as u64).rotate_left(32) ^ (num_labels as u64).rotate_left(16),
    );
    let compressor = Compressor::default();

    for _ in 0..iterations {
        let mut random = RandomTreeGenerator::new(ChaCha8Rng::seed_from_u64(seeder.gen()));
        let mut timer = Timer::new();
        let tree = random.generate_tree(size);
        let mut labels = Labels::new();
        let node_labels = random.random_labels(tree.num_nodes(), num_labels, &mut labels);
        let generation_duration = timer.get_and_reset();

        let mut compressed = compressor
            .compress(tree, &node_labels)
            .context("compression failed")?;
        compressed.debug.generation_duration = generation_duration;
        statistics.add_debug_info(&compressed.debug);
    }

    statistics.compute();
    let mut stdout = std::io::stdout().lock();
    statistics.dump(&mut stdout)?;
    Ok(())
}
