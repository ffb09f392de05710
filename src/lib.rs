//! A PQ-tree[^1] compactly represents every permutation of a ground set
//! that satisfies a collection of consecutivity constraints: each
//! constraint is a subset of the leaves that must occupy a contiguous
//! block.
//!
//! The tree mixes three kinds of nodes: P-nodes, whose children may be
//! permuted arbitrarily; Q-nodes, whose children are ordered up to
//! reversal; and leaves carrying the ground-set values.
//!
//! # Reduction
//!
//! [`PQTree::reduce`] intersects the admitted permutations with "this set
//! is consecutive". It runs the two-pass Booth–Lueker algorithm: a bubble
//! pass marks the pertinent subtree, then a fixed catalogue of local
//! templates rewrites the tree bottom-up. If the constraint is compatible
//! with everything applied so far the tree is rearranged to embed it;
//! otherwise the call fails and the tree is *poisoned*: every later
//! non-safe call fails too. [`PQTree::safe_reduce`] trades time for
//! safety by snapshotting the arena and rolling back on failure.
//!
//! Applied sets are recorded: [`PQTree::reductions`] returns the audit
//! log, [`PQTree::contained`] its union, and [`PQTree::reduced_frontier`]
//! restricts the frontier to leaves some reduction touched.
//!
//! # Frontier
//!
//! Reading the leaves left to right yields the *frontier*, one
//! representative of the admitted permutation family. [`PQTree::print`]
//! renders the whole structure (P-nodes as `(…)`, Q-nodes as `[…]`) and
//! `root`/`children`/`node_kind`/`leaf_value` allow read-only walks.
//!
//! # Example: consecutive ones
//!
//! A 0/1 matrix has the consecutive-ones property iff its rows can be
//! permuted so every column's ones form one contiguous run. Build a tree
//! over the row indices and reduce by each column's support:
//!
//! ```
//! use pqtree::PQTree;
//!
//! let mut tree = PQTree::new(&[1, 2, 3, 4, 5]);
//! tree.reduce(&[1, 2]).unwrap();
//! tree.reduce(&[1, 2, 3]).unwrap();
//! tree.reduce(&[4, 5]).unwrap();
//!
//! let frontier = tree.frontier();
//! let block = |s: &[i32]| {
//!     let mut at: Vec<usize> =
//!         s.iter().map(|v| frontier.iter().position(|f| f == v).unwrap()).collect();
//!     at.sort();
//!     at[at.len() - 1] - at[0] == s.len() - 1
//! };
//! assert!(block(&[1, 2]) && block(&[1, 2, 3]) && block(&[4, 5]));
//! ```
//!
//! An incompatible constraint fails and poisons the tree:
//!
//! ```
//! use pqtree::{PQTree, ReductionError};
//!
//! let mut tree = PQTree::new(&[1, 2, 3, 4]);
//! tree.reduce(&[1, 2]).unwrap();
//! tree.reduce(&[2, 3]).unwrap();
//! assert_eq!(tree.reduce(&[1, 3]).unwrap_err(), ReductionError::Irreducible);
//! assert_eq!(tree.reduce(&[3, 4]).unwrap_err(), ReductionError::Poisoned);
//! ```
//!
//! Sets with fewer than two elements are trivially consecutive; reducing
//! by them always succeeds and never rearranges anything.
//!
//! [^1]: Booth, K.S., & Lueker, G.S. (1976). Testing for the Consecutive
//! Ones Property, Interval Graphs, and Graph Planarity Using PQ-Tree
//! Algorithms. J. Comput. Syst. Sci., 13, 335-379.
//! <https://doi.org/10.1016/s0022-0000(76)80045-1>

pub use self::errors::ReductionError;
pub use self::node::NodeKind;
pub use self::tree::{NodeId, PQTree};

mod bubble;
mod errors;
mod node;
mod reduce;
mod templates;
mod tree;
