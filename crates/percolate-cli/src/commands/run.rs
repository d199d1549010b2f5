//! Generate a graph, attack it and write the percolation curve.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use percolate::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;

/// Command-line overrides for the values in percolate.toml.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Graph family: complete, erdos_renyi, small_world, scale_free
    #[arg(short, long)]
    pub graph: Option<String>,

    /// Attack strategy: random, degree, betweenness, fiedler
    #[arg(short, long)]
    pub attack: Option<String>,

    /// Number of nodes
    #[arg(short, long)]
    pub n: Option<usize>,

    /// Edge (Erdős–Rényi) or rewiring (small world) probability
    #[arg(short, long)]
    pub p: Option<f64>,

    /// Ring degree for small-world graphs
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Edges per new node for scale-free graphs
    #[arg(short, long)]
    pub m: Option<usize>,

    /// Seed for graph generation and the random attack
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of checkpoints (default: one per removal)
    #[arg(long)]
    pub num_steps: Option<usize>,

    /// Component kind: weak, strong, undirected
    #[arg(long)]
    pub kind: Option<String>,

    /// Score degree and betweenness with edge weights
    #[arg(short, long)]
    pub weighted: bool,

    /// Output file path
    #[arg(short, long)]
    pub out: Option<String>,

    /// Output format: csv or json
    #[arg(short, long)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Json,
}

/// Everything one run needs, after merging file and flags.
#[derive(Debug)]
struct Experiment {
    graph: GraphSpec,
    strategy: AttackStrategy,
    options: AttackOptions,
    seed: Option<u64>,
    percolation: PercolationConfig,
    output: PathBuf,
    format: OutputFormat,
}

fn resolve(mut config: Config, args: &RunArgs) -> Result<Experiment> {
    if let Some(family) = &args.graph {
        config.graph.family = family.clone();
    }
    if let Some(strategy) = &args.attack {
        config.attack.strategy = strategy.clone();
    }
    config.graph.n = args.n.unwrap_or(config.graph.n);
    config.graph.p = args.p.unwrap_or(config.graph.p);
    config.graph.k = args.k.unwrap_or(config.graph.k);
    config.graph.m = args.m.unwrap_or(config.graph.m);
    config.attack.seed = args.seed.or(config.attack.seed);
    config.attack.weighted |= args.weighted;
    config.percolation.num_steps = args.num_steps.or(config.percolation.num_steps);
    if let Some(kind) = &args.kind {
        config.percolation.kind = kind.clone();
    }
    if let Some(out) = &args.out {
        config.output.path = out.clone();
    }
    if let Some(format) = &args.format {
        config.output.format = format.clone();
    }

    let graph = GraphSpec {
        family: config.graph.family.parse()?,
        n: config.graph.n,
        p: config.graph.p,
        k: config.graph.k,
        m: config.graph.m,
    };

    let seed = config.attack.seed;
    let weighted = config.attack.weighted;
    let strategy = match config.attack.strategy.parse::<AttackStrategy>()? {
        AttackStrategy::Random { .. } => AttackStrategy::Random { seed },
        AttackStrategy::Degree { .. } => AttackStrategy::Degree { weighted },
        AttackStrategy::Betweenness { normalized, .. } => AttackStrategy::Betweenness {
            weighted,
            normalized,
        },
        AttackStrategy::FiedlerMagnitude => AttackStrategy::FiedlerMagnitude,
    };

    let format = match config.output.format.trim().to_ascii_lowercase().as_str() {
        "csv" => OutputFormat::Csv,
        "json" => OutputFormat::Json,
        other => bail!("Unknown output format '{}' (expected csv or json)", other),
    };

    Ok(Experiment {
        graph,
        strategy,
        options: AttackOptions {
            use_undirected: config.attack.use_undirected,
            spectral: config.spectral.clone(),
        },
        seed,
        percolation: PercolationConfig {
            num_steps: config.percolation.num_steps,
            kind: config.percolation.kind.parse()?,
            weighted_paths: config.percolation.weighted_paths,
            kirchhoff_max_n: config.percolation.kirchhoff_max_n,
            spectral: config.spectral,
        },
        output: PathBuf::from(config.output.path),
        format,
    })
}

pub fn run(args: &RunArgs, verbose: bool) -> Result<()> {
    let experiment = resolve(Config::load()?, args)?;
    debug!(?experiment, "resolved run settings");

    let mut rng = match experiment.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!(
        "{} Building {} graph with {} nodes...",
        "→".blue(),
        experiment.graph.family.to_string().cyan(),
        experiment.graph.n.to_string().cyan()
    );
    let graph = experiment
        .graph
        .build(&mut rng)
        .context("Failed to build graph")?;
    println!(
        "  {} nodes, {} edges",
        graph.node_count().to_string().cyan(),
        graph.edge_count().to_string().cyan()
    );

    println!(
        "{} Ordering nodes by {} attack...",
        "→".blue(),
        experiment.strategy.to_string().cyan()
    );
    let order = attack_order(&graph, &experiment.strategy, &experiment.options);

    let run = PercolationRun::new(&graph, &order, experiment.percolation.clone())?;
    let pb = ProgressBar::new(run.checkpoints().len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} checkpoints")?
            .progress_chars("#>-"),
    );

    let mut records = Vec::with_capacity(run.checkpoints().len());
    for record in run {
        if verbose {
            pb.println(format!(
                "  removed {:>5}  gcc {:.3}  components {}",
                record.removed_nodes, record.gcc_fraction, record.num_components
            ));
        }
        pb.inc(1);
        records.push(record);
    }
    pb.finish_and_clear();

    write_records(&records, &experiment.output, experiment.format)?;

    println!();
    println!("{} Percolation complete!", "✓".green().bold());
    println!("  Checkpoints: {}", records.len().to_string().green());
    if let Some(critical) = records.iter().find(|r| r.gcc_fraction < 0.5) {
        println!(
            "  Giant component below half after removing {}",
            format!("{:.1}%", critical.removed_fraction * 100.0).yellow()
        );
    }
    println!("  Written to {}", experiment.output.display().to_string().cyan());

    Ok(())
}

fn write_records(records: &[MetricsRecord], path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv_file(records, path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        OutputFormat::Json => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_json(records, BufWriter::new(file))?;
        }
    }
    Ok(())
}
