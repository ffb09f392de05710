use pqtree::{PQTree, ReductionError};

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

fn eight_tree_after_script() -> PQTree<i32> {
    let mut tree = PQTree::new(&(1..=8).collect::<Vec<_>>());
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
        tree.reduce(set).unwrap_or_else(|e| panic!("reducing by {set:?}: {e}"));
    }
    tree
}

#[test]
fn scenario_a_scripted_reductions() {
    let tree = eight_tree_after_script();
    let frontier = tree.frontier();
    for set in [&[3, 4, 5][..], &[3, 4, 6], &[2, 6], &[1, 2], &[3, 4], &[4, 5]] {
        assert!(is_block(&frontier, set), "{set:?} not consecutive in {frontier:?}");
    }
    assert_eq!(tree.reductions().len(), 7);
}

#[test]
fn scenario_b_conflicting_set_fails_and_poisons() {
    let mut tree = eight_tree_after_script();
    assert_eq!(tree.reduce(&[3, 5]), Err(ReductionError::Irreducible));
    // poisoned: even a previously fine set now fails
    assert_eq!(tree.reduce(&[3, 4]), Err(ReductionError::Poisoned));
}

#[test]
fn scenario_c_overlapping_sets() {
    let mut tree = PQTree::new(&(0..=5).collect::<Vec<_>>());
    let script: [&[i32]; 5] = [&[1, 4], &[0, 2, 3, 4, 5], &[0, 2, 4, 5], &[2, 5], &[0, 2]];
    for set in script {
        tree.reduce(set).unwrap_or_else(|e| panic!("reducing by {set:?}: {e}"));
    }
    let frontier = tree.frontier();
    assert!(is_block(&frontier, &[1, 4]), "1 not adjacent to 4 in {frontier:?}");
    assert!(is_block(&frontier, &[0, 2, 4, 5]), "{{0,2,4,5}} not a block in {frontier:?}");
    assert!(is_block(&frontier, &[2, 5]));
    assert!(is_block(&frontier, &[0, 2]));
}

#[test]
fn scenario_d_trivial_sets_leave_tree_bitwise_identical() {
    let mut tree = eight_tree_after_script();
    let before = tree.print();
    tree.reduce(&[]).unwrap();
    assert_eq!(tree.print(), before);
    tree.reduce(&[7]).unwrap();
    assert_eq!(tree.print(), before);
    // both trivial sets were still recorded
    assert_eq!(tree.reductions().len(), 9);
}

#[test]
fn scenario_f_safe_reduce_preserves_state_on_failure() {
    let mut tree = eight_tree_after_script();
    let print_before = tree.print();
    let frontier_before = tree.frontier();
    let reductions_before = tree.reductions().to_vec();

    assert_eq!(tree.safe_reduce(&[3, 5]), Err(ReductionError::Irreducible));

    assert_eq!(tree.print(), print_before);
    assert_eq!(tree.frontier(), frontier_before);
    assert_eq!(tree.reductions(), &reductions_before[..]);

    // the tree is not poisoned: further compatible reductions still work
    tree.reduce(&[4, 5]).unwrap();
}

#[test]
fn idempotent_reduction_changes_nothing() {
    let mut tree = PQTree::new(&(1..=6).collect::<Vec<_>>());
    tree.reduce(&[2, 3, 4]).unwrap();
    let print_once = tree.print();
    let frontier_once = tree.frontier();

    tree.reduce(&[2, 3, 4]).unwrap();
    assert_eq!(tree.print(), print_once);
    assert_eq!(tree.frontier(), frontier_once);
}

#[test]
fn copy_round_trip() {
    let tree = eight_tree_after_script();
    let copy = tree.clone();
    assert_eq!(copy.print(), tree.print());
    assert_eq!(copy.frontier(), tree.frontier());

    // the copy is independent: poisoning it leaves the original usable
    let mut copy = copy;
    assert!(copy.reduce(&[3, 5]).is_err());
    let mut original = tree;
    original.reduce(&[4, 5]).unwrap();
}

#[test]
fn reduced_frontier_keeps_only_touched_leaves() {
    let mut tree = PQTree::new(&(0..=7).collect::<Vec<_>>());
    tree.reduce(&[1, 2]).unwrap();
    tree.reduce(&[2, 3]).unwrap();

    let contained = tree.contained();
    assert_eq!(contained, [1, 2, 3].into_iter().collect());

    let reduced = tree.reduced_frontier();
    assert_eq!(reduced.len(), 3);
    assert!(is_block(&tree.frontier(), &[1, 2]));
    for v in reduced {
        assert!(contained.contains(&v));
    }
}

#[test]
fn every_accepted_reduction_is_a_frontier_block() {
    // property 1 over a handful of hand-picked sequences
    let sequences: Vec<Vec<Vec<i32>>> = vec![
        vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 4]],
        vec![vec![0, 1, 2, 3], vec![1, 2], vec![2, 3]],
        vec![vec![4, 5, 6], vec![0, 1], vec![5, 6], vec![1, 2, 3]],
        vec![vec![0, 1, 2, 3, 4, 5, 6], vec![2, 4, 6], vec![4, 6]],
    ];
    for sets in sequences {
        let mut tree = PQTree::new(&(0..=7).collect::<Vec<_>>());
        tree.reduce_all(&sets).unwrap_or_else(|e| panic!("{sets:?}: {e}"));
        let frontier = tree.frontier();
        for set in &sets {
            assert!(is_block(&frontier, set), "{set:?} not a block in {frontier:?}");
        }
    }
}

#[test]
fn q_node_shows_up_in_print() {
    // two overlapping pairs force an ordered (Q) spine
    let mut tree = PQTree::new(&(1..=4).collect::<Vec<_>>());
    tree.reduce(&[1, 2]).unwrap();
    tree.reduce(&[2, 3]).unwrap();
    let printed = tree.print();
    assert!(printed.contains('['), "expected a Q-node in {printed}");
}
