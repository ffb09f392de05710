//! Random-window fuzz driver. Every iteration fixes a hidden permutation
//! of the ground set and reduces by random consecutive windows of it, so
//! by construction every reduction must succeed; afterwards the frontier
//! must keep every window contiguous. Failures report the iteration seed.

use anyhow::{ensure, Context, Result};
use clap::Parser;
use pqtree::PQTree;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fuzztest", about = "PQ-tree random-window fuzz driver")]
struct Cli {
    /// Number of fuzz iterations.
    #[arg(long, default_value_t = 100)]
    iterations: usize,

    /// Reductions applied per iteration.
    #[arg(long, default_value_t = 20)]
    reductions: usize,

    /// Ground-set size of each tree.
    #[arg(long, default_value_t = 10)]
    size: usize,

    /// Master seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the tree after every reduction.
    #[arg(long)]
    verbose: bool,
}

fn is_block(frontier: &[usize], set: &[usize]) -> bool {
    let mut at: Vec<usize> = set
        .iter()
        .filter_map(|v| frontier.iter().position(|f| f == v))
        .collect();
    if at.len() != set.len() {
        return false;
    }
    at.sort_unstable();
    at[at.len() - 1] - at[0] == set.len() - 1
}

fn run_iteration(size: usize, reductions: usize, seed: u64, verbose: bool) -> Result<()> {
    let mut rng = Pcg64::seed_from_u64(seed);

    let ground: Vec<usize> = (0..size).collect();
    let mut hidden = ground.clone();
    hidden.shuffle(&mut rng);
    if verbose {
        println!("hidden permutation: {hidden:?}");
    }

    let mut tree = PQTree::new(&ground);
    let mut windows = Vec::with_capacity(reductions);

    for _ in 0..reductions {
        let start = rng.gen_range(0..size - 1);
        let len = rng.gen_range(2..=10).min(size - start);
        let window: Vec<usize> = hidden[start..start + len].to_vec();

        tree.reduce(&window)
            .with_context(|| format!("window {window:?} of {hidden:?}"))?;
        if verbose {
            println!("reduced by {window:?}: {tree}");
        }
        windows.push(window);
    }

    let frontier = tree.frontier();
    for window in &windows {
        ensure!(
            is_block(&frontier, window),
            "window {window:?} not contiguous in frontier {frontier:?}"
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    ensure!(cli.size >= 2, "--size must be at least 2");

    let master = cli.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    println!("master seed: {master}");

    let mut seeder = Pcg64::seed_from_u64(master);
    for i in 0..cli.iterations {
        let seed = seeder.next_u64();
        run_iteration(cli.size, cli.reductions, seed, cli.verbose)
            .with_context(|| format!("iteration {i} (seed {seed})"))?;
    }

    println!("ok: {} iterations", cli.iterations);
    Ok(())
}
