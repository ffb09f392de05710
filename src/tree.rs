use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Display, Formatter};
use std::hash::Hash;

use bimap::BiMap;

use crate::node::{Body, Link, NodeKind, QChildren, Slot, NIL};

/// Slot permanently reserved for the pseudo-node; never reachable from the
/// root and never recycled.
pub(crate) const PSEUDONODE: usize = 0;

/// Slot of the tree root. The root keeps its slot for the whole life of the
/// tree; templates that promote a child into the root's place overwrite the
/// slot body instead of moving the index.
pub(crate) const ROOT: usize = 1;

/// A PQ-tree over leaf values of type `T`.
///
/// Stores every node in an index arena: all parent, sibling and endmost
/// references are plain `usize` indices into `slots`, so a deep copy is an
/// arena clone and no pointer translation ever happens.
#[derive(Debug, Clone)]
pub struct PQTree<T>
where
    T: Copy + Eq + Hash,
{
    pub(crate) slots: Vec<Slot>,
    pub(crate) freelist: VecDeque<usize>,
    pub(crate) leaves: BiMap<T, usize>,
    pub(crate) reductions: Vec<Vec<T>>,
    pub(crate) invalid: bool,
}

/// Opaque handle to a node, for read-only inspection.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub struct NodeId(pub(crate) usize);

impl<T: Copy + Eq + Hash> PQTree<T> {
    /// Builds the unconstrained tree over `ground`: a single P-root with one
    /// leaf per distinct element. Duplicates in `ground` are ignored.
    pub fn new(ground: &[T]) -> PQTree<T> {
        let mut tree = PQTree {
            slots: vec![
                Slot::new(Body::Q { left: NIL, right: NIL }, Link::Top),
                Slot::new(Body::P { first: NIL }, Link::Top),
            ],
            freelist: VecDeque::new(),
            leaves: BiMap::new(),
            reductions: Vec::new(),
            invalid: false,
        };

        let mut ring = Vec::with_capacity(ground.len());
        for &value in ground {
            if tree.leaves.contains_left(&value) {
                continue;
            }
            let idx = tree.slots.len();
            tree.slots.push(Slot::new(Body::Leaf, Link::PChild { parent: ROOT, next: NIL }));
            tree.leaves.insert(value, idx);
            ring.push(idx);
        }

        if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
            for pair in ring.windows(2) {
                *tree.slots[pair[0]].link.p_next_mut() = pair[1];
            }
            *tree.slots[last].link.p_next_mut() = first;
            *tree.slots[ROOT].body.p_first_mut() = first;
        }

        tree
    }

    pub(crate) fn add_slot(&mut self, slot: Slot) -> usize {
        if let Some(free) = self.freelist.pop_front() {
            self.slots[free] = slot;
            free
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        }
    }

    /// Returns a slot to the free list. The children of the node, if any,
    /// must already have been relinked elsewhere; recycling never cascades.
    pub(crate) fn recycle(&mut self, idx: usize) {
        debug_assert!(!self.freelist.contains(&idx));
        debug_assert_ne!(idx, ROOT);
        debug_assert_ne!(idx, PSEUDONODE);
        self.slots[idx].link = Link::Top;
        self.freelist.push_back(idx);
    }

    fn collect_frontier(&self, idx: usize, out: &mut Vec<T>) {
        match self.slots[idx].body {
            Body::Leaf => {
                out.push(*self.leaves.get_by_right(&idx).expect("leaf index out of sync"));
            }
            Body::P { first } => {
                if first == NIL {
                    return;
                }
                let mut child = first;
                loop {
                    self.collect_frontier(child, out);
                    child = self.slots[child].link.p_next();
                    if child == first {
                        break;
                    }
                }
            }
            Body::Q { left, right } => {
                for child in QChildren::new(&self.slots, left, right) {
                    self.collect_frontier(child, out);
                }
            }
        }
    }

    /// One permutation admitted by the tree: the leaves left to right.
    pub fn frontier(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.leaves.len());
        self.collect_frontier(ROOT, &mut out);
        out
    }

    /// [`frontier`](PQTree::frontier) restricted to leaves that took part in
    /// at least one recorded reduction.
    pub fn reduced_frontier(&self) -> Vec<T> {
        let contained = self.contained();
        let mut out = self.frontier();
        out.retain(|value| contained.contains(value));
        out
    }

    /// Every reduction set applied so far, in application order. Trivial
    /// sets (fewer than two elements) are recorded too.
    pub fn reductions(&self) -> &[Vec<T>] {
        &self.reductions
    }

    /// Union of all recorded reduction sets.
    pub fn contained(&self) -> HashSet<T> {
        self.reductions.iter().flatten().copied().collect()
    }

    /// Handle to the tree root.
    pub fn root(&self) -> NodeId {
        NodeId(ROOT)
    }

    pub fn node_kind(&self, id: NodeId) -> NodeKind {
        match self.slots[id.0].body {
            Body::P { .. } => NodeKind::P,
            Body::Q { .. } => NodeKind::Q,
            Body::Leaf => NodeKind::Leaf,
        }
    }

    /// Children of a node in current internal order; empty for leaves.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.slots[id.0].body {
            Body::Leaf => Vec::new(),
            Body::P { first } => {
                let mut out = Vec::new();
                if first == NIL {
                    return out;
                }
                let mut child = first;
                loop {
                    out.push(NodeId(child));
                    child = self.slots[child].link.p_next();
                    if child == first {
                        break;
                    }
                }
                out
            }
            Body::Q { left, right } => {
                QChildren::new(&self.slots, left, right).map(NodeId).collect()
            }
        }
    }

    /// The value held by a leaf, or `None` for internal nodes.
    pub fn leaf_value(&self, id: NodeId) -> Option<T> {
        self.leaves.get_by_right(&id.0).copied()
    }
}

impl<T: Copy + Eq + Hash + Display> PQTree<T> {
    /// Debug rendering: P-nodes as `(…)`, Q-nodes as `[…]`, leaves as their
    /// value, children separated by single spaces.
    pub fn print(&self) -> String {
        self.to_string()
    }
}

impl<T: Copy + Eq + Hash + Display> Display for PQTree<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fn node_fmt<T>(tree: &PQTree<T>, idx: usize, f: &mut Formatter<'_>) -> fmt::Result
        where
            T: Copy + Eq + Hash + Display,
        {
            match tree.slots[idx].body {
                Body::Leaf => {
                    write!(f, "{}", tree.leaves.get_by_right(&idx).expect("leaf index out of sync"))
                }
                Body::P { first } => {
                    write!(f, "(")?;
                    if first != NIL {
                        let mut child = first;
                        loop {
                            node_fmt(tree, child, f)?;
                            child = tree.slots[child].link.p_next();
                            if child == first {
                                break;
                            }
                            write!(f, " ")?;
                        }
                    }
                    write!(f, ")")
                }
                Body::Q { left, right } => {
                    write!(f, "[")?;
                    for (i, child) in QChildren::new(&tree.slots, left, right).enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        node_fmt(tree, child, f)?;
                    }
                    write!(f, "]")
                }
            }
        }

        node_fmt(self, ROOT, f)
    }
}
