//! Randomized end-to-end checks. Each case is driven by a per-iteration
//! PCG seed printed on failure so broken runs can be replayed exactly.

use std::panic;

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64;

use pqtree::PQTree;

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

/// Builds a matrix whose columns all have consecutive ones in some hidden
/// row order, shuffles the rows, then checks that column-by-column
/// reduction recovers an order with every column contiguous.
fn consecutive_ones_case(rows: usize, cols: usize, seed: u64) {
    let mut rng = Pcg64::seed_from_u64(seed);

    let mut data = vec![vec![0u8; cols]; rows];
    for col in 0..cols {
        let start = rng.gen_range(0..rows);
        let end = rng.gen_range((start + 1)..=rows);
        data[start..end].iter_mut().for_each(|row| row[col] = 1);
    }
    data.shuffle(&mut rng);

    let mut tree = PQTree::new(&(0..rows).collect::<Vec<_>>());
    for col in 0..cols {
        let support: Vec<usize> = (0..rows).filter(|&r| data[r][col] == 1).collect();
        assert!(!support.is_empty());
        tree.reduce(&support)
            .unwrap_or_else(|e| panic!("column {col} support {support:?}: {e}"));
    }

    let frontier = tree.frontier();
    for col in 0..cols {
        let support: Vec<usize> = (0..rows).filter(|&r| data[r][col] == 1).collect();
        assert!(
            is_block(&frontier, &support),
            "column {col} not contiguous after reordering: {frontier:?}"
        );
    }
}

#[test]
fn consecutive_ones_random_matrices() {
    let mut rng = thread_rng();
    for i in 0..500 {
        let seed = rng.next_u64();
        let rows = rng.gen_range(2..=16);
        let cols = rng.gen_range(2..=16);

        if panic::catch_unwind(|| consecutive_ones_case(rows, cols, seed)).is_err() {
            panic!("iteration {i} failed: rows={rows} cols={cols} seed={seed}");
        }
    }
}

/// Scenario: windows of a hidden permutation are consecutive by
/// construction, so every reduction must succeed and every window must be
/// a block of the final frontier.
fn random_windows_case(size: usize, reductions: usize, seed: u64) {
    let mut rng = Pcg64::seed_from_u64(seed);

    let ground: Vec<usize> = (0..size).collect();
    let mut hidden = ground.clone();
    hidden.shuffle(&mut rng);

    let mut tree = PQTree::new(&ground);
    let mut windows = Vec::with_capacity(reductions);
    for _ in 0..reductions {
        let start = rng.gen_range(0..size - 1);
        let len = rng.gen_range(2..=size).min(size - start);
        let window: Vec<usize> = hidden[start..start + len].to_vec();
        tree.reduce(&window)
            .unwrap_or_else(|e| panic!("window {window:?} of {hidden:?}: {e}"));
        windows.push(window);
    }

    let frontier = tree.frontier();
    for window in &windows {
        assert!(
            is_block(&frontier, window),
            "window {window:?} not contiguous in {frontier:?} (hidden {hidden:?})"
        );
    }
}

#[test]
fn random_window_reductions() {
    let mut rng = thread_rng();
    for i in 0..1000 {
        let seed = rng.next_u64();
        if panic::catch_unwind(|| random_windows_case(10, 20, seed)).is_err() {
            panic!("iteration {i} failed: seed={seed}");
        }
    }
}
