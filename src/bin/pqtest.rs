//! Scripted harness: drives a fixed reduction sequence against an
//! 8-element tree, prints the tree after every step and checks the final
//! frontier. Exits 0 when every step behaves as expected.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pqtree::PQTree;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pqtest", about = "Scripted PQ-tree reduction harness")]
struct Cli {
    /// Suppress the per-step tree dumps.
    #[arg(long)]
    quiet: bool,
}

fn is_block(frontier: &[i32], set: &[i32]) -> bool {
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

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let ground: Vec<i32> = (1..=8).collect();
    let mut tree = PQTree::new(&ground);
    if !cli.quiet {
        println!("initial: {tree}");
    }

    let script: [&[i32]; 7] = [
        &[3, 4],
        &[3, 4, 6],
        &[3, 4, 5],
        &[4, 5],
        &[2, 6],
        &[1, 2],
        &[4, 5],
    ];
    for set in script {
        tree.reduce(set).with_context(|| format!("reducing by {set:?}"))?;
        if !cli.quiet {
            println!("reduced by {set:?}: {tree}");
        }
    }

    // {3,5} conflicts with {3,4} and {4,5}; safe_reduce must reject it
    // and leave the tree untouched.
    let before = tree.print();
    if tree.safe_reduce(&[3, 5]).is_ok() {
        bail!("{{3, 5}} was unexpectedly accepted");
    }
    if tree.print() != before {
        bail!("failed safe_reduce changed the tree");
    }
    if !cli.quiet {
        println!("rejected {{3, 5}}, tree unchanged: {tree}");
    }

    let frontier = tree.frontier();
    for set in [&[3, 4, 5][..], &[3, 4, 6], &[2, 6], &[1, 2]] {
        if !is_block(&frontier, set) {
            bail!("{set:?} is not consecutive in {frontier:?}");
        }
    }

    println!("ok");
    Ok(())
}
