//! The Booth–Lueker template catalogue: per-node pattern match and rewrite.
//!
//! Templates are grouped by node kind. The fixed trial order of the paper
//! (L1; P1–P6; Q1–Q3) is realized as the match order inside each handler,
//! with the root-only templates (P2, P4, P6, Q3) gated on the `root` flag
//! the driver passes in.

use std::hash::Hash;

use enum_map::EnumMap;
use tracing::trace;

use crate::node::{Body, Link, NodeLabel, QChildren, Slot};
use crate::tree::{PQTree, PSEUDONODE};

/// A run of same-labeled P-children, spliced out of the host's circular
/// list as its own circular list.
#[derive(Debug, Default)]
pub(crate) struct Run {
    first: usize,
    last: usize,
    len: usize,
}

impl Run {
    fn add(&mut self, idx: usize) {
        if self.len == 0 {
            self.first = idx;
        }
        self.last = idx;
        self.len += 1;
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn len(&self) -> usize {
        self.len
    }

    fn first(&self) -> usize {
        debug_assert_ne!(self.len, 0);
        self.first
    }

    fn last(&self) -> usize {
        debug_assert_ne!(self.len, 0);
        self.last
    }
}

/// Outcome of one scan over a Q-node's children.
enum QShape {
    /// No pertinent children at all.
    AllEmpty,
    /// Every child full (Q1).
    AllFull,
    /// One maximal full run touching an end, optionally capped by one
    /// partial child (Q2).
    SinglyPartial,
    /// One maximal full run strictly inside, capped by up to two partial
    /// children (Q3; legal at the pertinent root only).
    DoublyPartial,
}

struct QScan {
    shape: QShape,
    /// Partial children in scan order with the orientation each one needs:
    /// `true` means its empty end must face left.
    partials: Vec<(usize, bool)>,
}

/// Child-sequence states while scanning a Q-node left to right. The names
/// spell the run structure seen so far: `E` empties, `F` fulls.
enum Seq {
    Start,
    E,
    F,
    EF,
    FE,
    EFE,
    /// A partial child opened the sequence; its orientation is decided by
    /// the next label.
    LeadPartial(usize),
}

impl<T: Copy + Eq + Hash> PQTree<T> {
    fn set_label(&mut self, x: usize, label: NodeLabel) -> bool {
        self.slots[x].red.label = label;
        true
    }

    /// Leaf template L1.
    pub(crate) fn apply_l_templates(&mut self, x: usize, _root: bool) -> bool {
        self.set_label(x, NodeLabel::Full)
    }

    /// P-node templates: P1 (all full), then P2/P3 (no partial children),
    /// P4/P5 (one partial child), P6 (two partial children, root only).
    pub(crate) fn apply_p_templates(&mut self, x: usize, first: usize, root: bool) -> bool {
        let census = self.split_p_children(first);
        let full = census[NodeLabel::Full].len();
        let empty = census[NodeLabel::Empty].len();

        match census[NodeLabel::Partial].len() {
            0 => {
                if full == 0 {
                    // no pertinent children; nothing to arrange
                    return self.set_label(x, NodeLabel::Empty);
                }
                if empty == 0 {
                    trace!(node = x, "template P1");
                    return self.set_label(x, NodeLabel::Full);
                }
                if root {
                    // P2: gather the full children under one fresh child;
                    // a lone full child simply stays where it is.
                    let full_agg = self.aggregate_p(&census[NodeLabel::Full], NodeLabel::Full);
                    self.recombine_p(x, &census[NodeLabel::Empty], full_agg);
                    trace!(node = x, "template P2");
                    true
                } else {
                    // P3: the host becomes a two-ended Q-node separating
                    // the empty aggregate from the full aggregate.
                    let full_agg = self.aggregate_p(&census[NodeLabel::Full], NodeLabel::Full);
                    let empty_agg = self.aggregate_p(&census[NodeLabel::Empty], NodeLabel::Empty);
                    self.slots[x].body = Body::Q { left: empty_agg, right: full_agg };
                    self.slots[empty_agg].link = Link::QLeft { parent: x, right: full_agg };
                    self.slots[full_agg].link = Link::QRight { parent: x, left: empty_agg };
                    trace!(node = x, "template P3");
                    self.set_label(x, NodeLabel::Partial)
                }
            }
            1 => {
                // P4 at the root, P5 elsewhere. The partial child absorbs
                // the host's full children on its full end.
                let sp = census[NodeLabel::Partial].first();
                let (sp_left, _) = self.slots[sp].body.q_ends();
                let full_on_left = self.slots[sp_left].red.label == NodeLabel::Full;

                if full > 0 {
                    let full_agg = self.aggregate_p(&census[NodeLabel::Full], NodeLabel::Full);
                    self.attach_to_q(sp, full_agg, full_on_left);
                }

                if root {
                    debug_assert!(full > 0, "pertinent root would have been the partial child");
                    if empty > 0 {
                        self.recombine_p(x, &census[NodeLabel::Empty], sp);
                    } else {
                        self.promote_q(x, sp);
                    }
                    trace!(node = x, "template P4");
                    true
                } else {
                    // P5: the partial child also absorbs the empty
                    // children on its empty end, then takes the host's
                    // place.
                    if empty > 0 {
                        let empty_agg =
                            self.aggregate_p(&census[NodeLabel::Empty], NodeLabel::Empty);
                        self.attach_to_q(sp, empty_agg, !full_on_left);
                    }
                    self.promote_q(x, sp);
                    trace!(node = x, "template P5");
                    self.set_label(x, NodeLabel::Partial)
                }
            }
            2 if root => {
                // P6: fuse the two partial children into one Q-node,
                // joining their full ends around the host's full children.
                let sp1 = census[NodeLabel::Partial].first();
                let sp2 = census[NodeLabel::Partial].last();

                let empty_on_left = |tree: &Self, q: usize| {
                    let (left, _) = tree.slots[q].body.q_ends();
                    tree.slots[left].red.label == NodeLabel::Empty
                };
                let (left_q, right_q) = match (empty_on_left(self, sp1), empty_on_left(self, sp2))
                {
                    (true, false) => (sp1, sp2),
                    (false, true) => (sp2, sp1),
                    (true, true) => {
                        self.reverse_q(sp2);
                        (sp1, sp2)
                    }
                    (false, false) => {
                        self.reverse_q(sp1);
                        (sp1, sp2)
                    }
                };
                debug_assert_ne!(left_q, PSEUDONODE);

                if full > 0 {
                    let full_agg = self.aggregate_p(&census[NodeLabel::Full], NodeLabel::Full);
                    self.attach_to_q(left_q, full_agg, false);
                }

                // splice right_q's chain onto left_q's right end
                let (_, seam_left) = self.slots[left_q].body.q_ends();
                let (seam_right, far_right) = self.slots[right_q].body.q_ends();

                self.slots[seam_left].link = self.slots[seam_left].link.mid_with_right(seam_right);
                self.slots[seam_right].link =
                    self.slots[seam_right].link.mid_with_left(seam_left);

                *self.slots[left_q].body.q_right_mut() = far_right;
                *self.slots[far_right].link.q_parent_mut() = left_q;

                self.recycle(right_q);

                if empty > 0 {
                    self.recombine_p(x, &census[NodeLabel::Empty], left_q);
                } else {
                    self.promote_q(x, left_q);
                }
                trace!(node = x, "template P6");
                true
            }
            _ => false,
        }
    }

    /// Q-node templates Q1–Q3: one validating scan, then dissolve the
    /// partial children the scan recorded.
    pub(crate) fn apply_q_templates(
        &mut self,
        x: usize,
        left: usize,
        right: usize,
        root: bool,
    ) -> bool {
        let Some(scan) = self.scan_q_children(left, right) else {
            return false;
        };

        let label = match scan.shape {
            QShape::AllEmpty => NodeLabel::Empty,
            QShape::AllFull => {
                trace!(node = x, "template Q1");
                NodeLabel::Full
            }
            QShape::SinglyPartial => {
                trace!(node = x, "template Q2");
                NodeLabel::Partial
            }
            QShape::DoublyPartial => {
                if !root {
                    return false;
                }
                trace!(node = x, "template Q3");
                NodeLabel::Partial
            }
        };

        for &(child, empty_on_left) in &scan.partials {
            self.dissolve_partial(child, empty_on_left);
        }

        self.set_label(x, label)
    }

    /// One pass over a Q-node's children validating the shape
    /// `empty* (partial? full* partial?) empty*` and recording each partial
    /// child with the orientation it must take. `None` means no template
    /// can match.
    fn scan_q_children(&self, left: usize, right: usize) -> Option<QScan> {
        let mut partials: Vec<(usize, bool)> = Vec::new();
        let mut seq = Seq::Start;

        for child in QChildren::new(&self.slots, left, right) {
            seq = match (seq, self.slots[child].red.label) {
                (Seq::Start, NodeLabel::Empty) => Seq::E,
                (Seq::Start, NodeLabel::Full) => Seq::F,
                (Seq::Start, NodeLabel::Partial) => Seq::LeadPartial(child),

                (s @ (Seq::E | Seq::FE | Seq::EFE), NodeLabel::Empty) => s,
                (s @ (Seq::F | Seq::EF), NodeLabel::Full) => s,

                (Seq::E, NodeLabel::Full) => Seq::EF,
                (Seq::F, NodeLabel::Empty) => Seq::FE,
                (Seq::EF, NodeLabel::Empty) => Seq::EFE,

                (Seq::E, NodeLabel::Partial) => {
                    partials.push((child, true));
                    Seq::EF
                }
                (Seq::F, NodeLabel::Partial) => {
                    partials.push((child, false));
                    Seq::FE
                }
                (Seq::EF, NodeLabel::Partial) => {
                    partials.push((child, false));
                    Seq::EFE
                }

                (Seq::LeadPartial(lead), NodeLabel::Empty) => {
                    partials.push((lead, false));
                    Seq::FE
                }
                (Seq::LeadPartial(lead), NodeLabel::Full) => {
                    partials.push((lead, true));
                    Seq::EF
                }
                (Seq::LeadPartial(lead), NodeLabel::Partial) => {
                    partials.push((lead, true));
                    partials.push((child, false));
                    Seq::EFE
                }

                (Seq::FE | Seq::EFE, NodeLabel::Full | NodeLabel::Partial) => return None,
            };
        }

        let shape = match seq {
            Seq::Start => unreachable!("Q-node with no children"),
            Seq::LeadPartial(_) => panic!("Q-node with a single child"),
            Seq::E => QShape::AllEmpty,
            Seq::F => QShape::AllFull,
            Seq::EF | Seq::FE => QShape::SinglyPartial,
            Seq::EFE => QShape::DoublyPartial,
        };
        Some(QScan { shape, partials })
    }

    /// Splits a P-node's circular child list into one circular list per
    /// label, in a single pass. Runs of equal labels keep their original
    /// links; only the boundaries are rewired.
    fn split_p_children(&mut self, first: usize) -> EnumMap<NodeLabel, Run> {
        let mut census: EnumMap<NodeLabel, Run> = EnumMap::default();

        let mut prev = self.slots[first].red.label;
        census[prev].add(first);

        let mut current = self.slots[first].link.p_next();
        while current != first {
            let label = self.slots[current].red.label;
            if label != prev {
                // close the run we are leaving
                let (close_last, close_first) = (census[prev].last(), census[prev].first());
                *self.slots[close_last].link.p_next_mut() = close_first;
                // reopen this label's list toward the current node
                if !census[label].is_empty() {
                    let reopen = census[label].last();
                    *self.slots[reopen].link.p_next_mut() = current;
                }
                prev = label;
            }
            census[label].add(current);
            current = self.slots[current].link.p_next();
        }
        let (close_last, close_first) = (census[prev].last(), census[prev].first());
        *self.slots[close_last].link.p_next_mut() = close_first;

        census
    }

    /// A single node representing `run`: the lone member itself, or a new
    /// P-node over all of them. The caller wires the result's link.
    fn aggregate_p(&mut self, run: &Run, label: NodeLabel) -> usize {
        if run.len() == 1 {
            return run.first();
        }
        let agg = self.add_slot(Slot::new(Body::P { first: run.first() }, Link::Top));
        self.slots[agg].red.label = label;

        let mut current = run.first();
        loop {
            *self.slots[current].link.p_parent_mut() = agg;
            current = self.slots[current].link.p_next();
            if current == run.first() {
                break;
            }
        }
        agg
    }

    /// Rebuilds host `p` as the empty run plus one extra child.
    fn recombine_p(&mut self, p: usize, empties: &Run, extra: usize) {
        *self.slots[p].body.p_first_mut() = empties.first();
        *self.slots[empties.last()].link.p_next_mut() = extra;
        self.slots[extra].link = Link::PChild { parent: p, next: empties.first() };
    }

    /// Attaches `child` as the new endmost child of Q-node `q`.
    fn attach_to_q(&mut self, q: usize, child: usize, to_left: bool) {
        if to_left {
            let (old_left, _) = self.slots[q].body.q_ends();
            self.slots[child].link = Link::QLeft { parent: q, right: old_left };
            self.slots[old_left].link = self.slots[old_left].link.mid_with_left(child);
            *self.slots[q].body.q_left_mut() = child;
        } else {
            let (_, old_right) = self.slots[q].body.q_ends();
            self.slots[child].link = Link::QRight { parent: q, left: old_right };
            self.slots[old_right].link = self.slots[old_right].link.mid_with_right(child);
            *self.slots[q].body.q_right_mut() = child;
        }
    }

    /// Reverses the child order of Q-node `q` in place.
    fn reverse_q(&mut self, q: usize) {
        debug_assert_ne!(q, PSEUDONODE);

        let (old_left, old_right) = self.slots[q].body.q_ends();

        let mut current = self.slots[old_left].link.right();
        while let Link::QMid { left, right, .. } = &mut self.slots[current].link {
            current = *right;
            std::mem::swap(left, right);
        }

        *self.slots[q].body.q_left_mut() = old_right;
        *self.slots[q].body.q_right_mut() = old_left;

        let inner_left = self.slots[old_right].link.left();
        let inner_right = self.slots[old_left].link.right();
        self.slots[old_right].link = Link::QLeft { parent: q, right: inner_left };
        self.slots[old_left].link = Link::QRight { parent: q, left: inner_right };
    }

    /// Overwrites P-node `target` with Q-node `source`'s body, reclaiming
    /// the source slot. Endmost children adopt the target.
    fn promote_q(&mut self, target: usize, source: usize) {
        debug_assert_ne!(target, PSEUDONODE);

        self.slots[target].body = self.slots[source].body;
        self.slots[target].red.label = self.slots[source].red.label;

        let (left, right) = self.slots[target].body.q_ends();
        *self.slots[left].link.q_parent_mut() = target;
        *self.slots[right].link.q_parent_mut() = target;

        self.recycle(source);
    }

    /// Dissolves a partial Q-child into its host by splicing its endmost
    /// children into the host's sibling chain, empty end facing left when
    /// `empty_on_left`. The child's children survive; the child does not.
    ///
    /// On the pseudo-node the run ends carry interior links pointing at
    /// the surrounding empty siblings of the real Q-node, so the same
    /// splice reconnects the seam there with no extra bookkeeping.
    fn dissolve_partial(&mut self, child: usize, empty_on_left: bool) {
        let (left_end, _) = self.slots[child].body.q_ends();
        let left_is_empty = self.slots[left_end].red.label == NodeLabel::Empty;
        if left_is_empty != empty_on_left {
            self.reverse_q(child);
        }

        let host_link = self.slots[child].link;
        let (leftmost, rightmost) = self.slots[child].body.q_ends();

        match host_link {
            Link::QLeft { parent, right } => {
                *self.slots[parent].body.q_left_mut() = leftmost;
                *self.slots[leftmost].link.q_parent_mut() = parent;
                self.slots[rightmost].link = self.slots[rightmost].link.mid_with_right(right);
                *self.slots[right].link.left_mut() = rightmost;
            }
            Link::QRight { parent, left } => {
                *self.slots[parent].body.q_right_mut() = rightmost;
                *self.slots[rightmost].link.q_parent_mut() = parent;
                self.slots[leftmost].link = self.slots[leftmost].link.mid_with_left(left);
                *self.slots[left].link.right_mut() = leftmost;
            }
            Link::QMid { left, right, .. } => {
                self.slots[leftmost].link = self.slots[leftmost].link.mid_with_left(left);
                *self.slots[left].link.right_mut() = leftmost;
                self.slots[rightmost].link = self.slots[rightmost].link.mid_with_right(right);
                *self.slots[right].link.left_mut() = rightmost;
            }
            other => panic!("partial child is not a Q-child: {other:?}"),
        }

        self.recycle(child);
    }
}

#[cfg(test)]
mod tests {
    use crate::node::NodeLabel;
    use crate::tree::PQTree;

    fn assert_block(tree: &PQTree<i32>, set: &[i32]) {
        let out = tree.frontier();
        let mut pos: Vec<usize> =
            set.iter().map(|v| out.iter().position(|o| o == v).unwrap()).collect();
        pos.sort_unstable();
        assert_eq!(pos[pos.len() - 1] - pos[0], set.len() - 1, "{set:?} not a block in {out:?}");
    }

    #[test]
    fn partial_p_node_becomes_q_spine() {
        // {1,2,3} groups three leaves under a P-node; {2,3,4} then hits
        // that node as a non-root mix of full and empty children, forcing
        // it into a two-ended Q absorbed by the root.
        let mut tree = PQTree::new(&[1, 2, 3, 4, 5, 6]);
        tree.reduce(&[1, 2, 3]).unwrap();
        tree.reduce(&[2, 3, 4]).unwrap();
        assert_block(&tree, &[1, 2, 3]);
        assert_block(&tree, &[2, 3, 4]);
        assert!(tree.print().contains('['), "expected a Q-node in {}", tree.print());
    }

    #[test]
    fn q_node_grows_along_overlapping_pairs() {
        // the chain of overlapping pairs repeatedly extends one Q-node
        let mut tree = PQTree::new(&[1, 2, 3, 4, 5]);
        tree.reduce(&[1, 2]).unwrap();
        tree.reduce(&[2, 3]).unwrap();
        tree.reduce(&[3, 4]).unwrap();
        tree.reduce(&[4, 5]).unwrap();
        let out = tree.frontier();
        assert!(out == vec![1, 2, 3, 4, 5] || out == vec![5, 4, 3, 2, 1], "got {out:?}");
    }

    #[test]
    fn labels_reset_between_reductions() {
        let mut tree = PQTree::new(&[1, 2, 3, 4]);
        tree.reduce(&[1, 2]).unwrap();
        assert!(tree
            .slots
            .iter()
            .all(|s| s.red.label == NodeLabel::Empty && s.red.pertinent_leaves == 0));
    }
}
