//! First pass of a reduction: walk upward from the pertinent leaves,
//! marking the pertinent subtree and reconstructing parent pointers for
//! interior Q-children from their sibling linkage.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use tracing::trace;

use crate::errors::ReductionError;
use crate::node::{Body, Link, NodeMark, Slot, NIL};
use crate::tree::{PQTree, PSEUDONODE};

/// Unblocks the contiguous run of blocked siblings starting at `first`,
/// walking away from the node that triggered the unblock. Every node in the
/// run adopts `parent` and counts once toward its pertinent children.
/// Returns the last node unblocked, i.e. the far end of the run.
fn unblock_run(
    slots: &mut [Slot],
    parent: usize,
    first: Option<usize>,
    toward_left: bool,
    blocked: &mut HashSet<usize>,
) -> Option<usize> {
    let mut last = None;
    let mut next = first?;
    loop {
        slots[next].red.mark = NodeMark::Unblocked;
        slots[parent].red.pertinent_children += 1;
        blocked.remove(&next);
        last = Some(next);

        // only interior Q-children can be blocked
        if let Link::QMid { parent_hint, left, right } = &mut slots[next].link {
            *parent_hint = parent;
            next = if toward_left { *left } else { *right };
        } else {
            break;
        }

        if slots[next].red.mark != NodeMark::Blocked {
            break;
        }
    }
    last
}

impl<T: Copy + Eq + Hash> PQTree<T> {
    /// Marks the pertinent subtree for the reduction over `pertinent` leaf
    /// slots. On success every pertinent node is unblocked with a trusted
    /// parent, except for a lone leftover blocked node (necessarily the
    /// pertinent root) or an interior blocked run, which is adopted by the
    /// pseudo-node.
    pub(crate) fn bubble(&mut self, pertinent: &[usize]) -> Result<(), ReductionError<T>> {
        let mut queue: VecDeque<usize> = pertinent.to_vec().into();
        let mut blocked: HashSet<usize> = HashSet::new();
        let mut block_count = 0usize;
        let mut off_the_top = 0usize;

        while queue.len() + block_count + off_the_top > 1 {
            let Some(x) = queue.pop_front() else {
                return Err(ReductionError::Irreducible);
            };

            // Decide x's mark from its immediate siblings. A node with
            // fewer than two siblings (P-child, endmost Q-child, root) can
            // always be unblocked: its parent link is authoritative.
            let mut link = self.slots[x].link;
            let (left_blocked, right_blocked) = match &mut link {
                Link::QMid { parent_hint, left, right } => {
                    let left_mark = self.slots[*left].red.mark;
                    let right_mark = self.slots[*right].red.mark;

                    if left_mark == NodeMark::Unblocked {
                        self.slots[x].red.mark = NodeMark::Unblocked;
                        *parent_hint = self.slots[*left].pertinent_parent();
                    } else if right_mark == NodeMark::Unblocked {
                        self.slots[x].red.mark = NodeMark::Unblocked;
                        *parent_hint = self.slots[*right].pertinent_parent();
                    } else {
                        self.slots[x].red.mark = NodeMark::Blocked;
                    }

                    (
                        (left_mark == NodeMark::Blocked).then_some(*left),
                        (right_mark == NodeMark::Blocked).then_some(*right),
                    )
                }
                plain => {
                    self.slots[x].red.mark = NodeMark::Unblocked;
                    match *plain {
                        Link::QRight { left, .. } => (
                            (self.slots[left].red.mark == NodeMark::Blocked).then_some(left),
                            None,
                        ),
                        Link::QLeft { right, .. } => (
                            None,
                            (self.slots[right].red.mark == NodeMark::Blocked).then_some(right),
                        ),
                        _ => (None, None),
                    }
                }
            };
            self.slots[x].link = link;

            let adjoining =
                usize::from(left_blocked.is_some()) + usize::from(right_blocked.is_some());

            if self.slots[x].red.mark == NodeMark::Unblocked {
                let parent = self.slots[x].pertinent_parent();

                unblock_run(&mut self.slots, parent, left_blocked, true, &mut blocked);
                unblock_run(&mut self.slots, parent, right_blocked, false, &mut blocked);

                if parent == NIL {
                    off_the_top = 1;
                } else {
                    self.slots[parent].red.pertinent_children += 1;
                    if self.slots[parent].red.mark == NodeMark::Unmarked {
                        self.slots[parent].red.mark = NodeMark::Queued;
                        queue.push_back(parent);
                    }
                }
                block_count -= adjoining;
            } else {
                blocked.insert(x);
                block_count += 1;
                block_count -= adjoining;
            }
        }

        if block_count > 1 || (off_the_top == 1 && block_count != 0) {
            return Err(ReductionError::Irreducible);
        }

        // A lone blocked node is the pertinent root and needs no parent.
        // A longer blocked run lies strictly inside a Q-node's sibling
        // chain: adopt it under the pseudo-node so the second pass can
        // treat the run as an ordinary Q-node.
        if blocked.len() > 1 {
            let seed = *blocked.iter().next().expect("blocked set non-empty");
            let left = unblock_run(&mut self.slots, PSEUDONODE, Some(seed), true, &mut blocked)
                .expect("seed itself must unblock");
            let right = unblock_run(&mut self.slots, PSEUDONODE, Some(seed), false, &mut blocked)
                .expect("seed itself must unblock");
            self.slots[PSEUDONODE].body = Body::Q { left, right };
            // both walks counted the seed
            self.slots[PSEUDONODE].red.pertinent_children -= 1;
            trace!(left, right, "adopted interior blocked run under pseudo-node");
        }

        Ok(())
    }
}
