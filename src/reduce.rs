//! Second pass and public reduction entry points.
//!
//! The driver walks the pertinent subtree leaf to root in the order the
//! bubble pass prepared, applying templates at every node. A failed
//! non-safe reduction poisons the tree for good; the safe entry points
//! snapshot the arena up front and roll back instead.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use tracing::debug;

use crate::errors::ReductionError;
use crate::node::{Body, Link, NodeMark, Scratch, NIL};
use crate::tree::{PQTree, PSEUDONODE};

impl<T: Copy + Eq + Hash> PQTree<T> {
    /// Narrows the admitted permutations to those keeping `s` consecutive.
    ///
    /// Sets with fewer than two distinct elements are recorded and trivially
    /// succeed. Any failure (unknown element, irreducible constraint)
    /// poisons the tree: every later non-safe call fails with
    /// [`ReductionError::Poisoned`].
    pub fn reduce(&mut self, s: &[T]) -> Result<(), ReductionError<T>> {
        let set = dedup_ordered(s);
        if set.len() < 2 {
            self.reductions.push(set);
            return Ok(());
        }
        if self.invalid {
            return Err(ReductionError::Poisoned);
        }

        let mut pertinent = Vec::with_capacity(set.len());
        for value in &set {
            match self.leaves.get_by_left(value) {
                Some(&idx) => pertinent.push(idx),
                None => return self.poison(ReductionError::UnknownElement(*value)),
            }
        }

        debug!(size = set.len(), "reducing");

        if let Err(e) = self.bubble(&pertinent) {
            return self.poison(e);
        }
        if let Err(e) = self.match_templates(&pertinent) {
            self.clean_pseudonode();
            return self.poison(e);
        }

        self.clean_pseudonode();
        self.reset_scratch();
        self.reductions.push(set);
        Ok(())
    }

    /// Applies [`reduce`](PQTree::reduce) to every set in order, stopping
    /// (and leaving the tree poisoned) at the first failure.
    pub fn reduce_all(&mut self, sets: &[Vec<T>]) -> Result<(), ReductionError<T>> {
        for s in sets {
            self.reduce(s)?;
        }
        Ok(())
    }

    /// Like [`reduce`](PQTree::reduce), but on failure the tree is restored
    /// to its exact pre-call state instead of being poisoned.
    pub fn safe_reduce(&mut self, s: &[T]) -> Result<(), ReductionError<T>> {
        let snapshot = self.clone();
        let outcome = self.reduce(s);
        if outcome.is_err() {
            *self = snapshot;
        }
        outcome
    }

    /// Like [`reduce_all`](PQTree::reduce_all) with rollback: on failure no
    /// set in `sets` has any effect.
    pub fn safe_reduce_all(&mut self, sets: &[Vec<T>]) -> Result<(), ReductionError<T>> {
        let snapshot = self.clone();
        let outcome = self.reduce_all(sets);
        if outcome.is_err() {
            *self = snapshot;
        }
        outcome
    }

    fn poison(&mut self, error: ReductionError<T>) -> Result<(), ReductionError<T>> {
        self.invalid = true;
        Err(error)
    }

    /// Leaf-to-root template application over the pertinent subtree.
    fn match_templates(&mut self, pertinent: &[usize]) -> Result<(), ReductionError<T>> {
        let mut queue: VecDeque<usize> = pertinent.to_vec().into();
        for &leaf in pertinent {
            self.slots[leaf].red.pertinent_leaves = 1;
        }

        while let Some(x) = queue.pop_front() {
            let root = self.slots[x].red.pertinent_leaves >= pertinent.len();

            if !root {
                debug_assert_eq!(self.slots[x].red.mark, NodeMark::Unblocked);

                let parent = self.slots[x].pertinent_parent();
                self.slots[parent].red.pertinent_leaves += self.slots[x].red.pertinent_leaves;
                self.slots[parent].red.pertinent_children -= 1;
                // the parent is ready once its last pertinent child reports
                if self.slots[parent].red.pertinent_children == 0 {
                    queue.push_back(parent);
                }
            }

            let matched = match self.slots[x].body {
                Body::Leaf => self.apply_l_templates(x, root),
                Body::P { first } => self.apply_p_templates(x, first, root),
                Body::Q { left, right } => self.apply_q_templates(x, left, right, root),
            };
            if !matched {
                debug!(node = x, root, "no template matched");
                return Err(ReductionError::Irreducible);
            }
        }
        Ok(())
    }

    /// Returns the reserved pseudo-node slot to its idle state. Both
    /// endmost references are dropped; the run's own sibling links were
    /// never severed, so there is no seam to repair.
    fn clean_pseudonode(&mut self) {
        self.slots[PSEUDONODE].body = Body::Q { left: NIL, right: NIL };
        self.slots[PSEUDONODE].link = Link::Top;
        self.slots[PSEUDONODE].red = Scratch::default();
    }

    /// Clears every label, mark and counter so the next reduction starts
    /// from a clean slate.
    fn reset_scratch(&mut self) {
        for slot in &mut self.slots {
            slot.red = Scratch::default();
        }
    }
}

fn dedup_ordered<T: Copy + Eq + Hash>(s: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(s.len());
    s.iter().copied().filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use crate::errors::ReductionError;
    use crate::tree::PQTree;

    #[test]
    fn trivial_sets_always_succeed() {
        let mut tree = PQTree::new(&[1, 2, 3]);
        let before = tree.print();
        tree.reduce(&[]).unwrap();
        tree.reduce(&[2]).unwrap();
        tree.reduce(&[99]).unwrap(); // unknown but trivial: recorded, no-op
        assert_eq!(tree.print(), before);
        assert_eq!(tree.reductions().len(), 3);
    }

    #[test]
    fn unknown_element_poisons() {
        let mut tree = PQTree::new(&[1, 2, 3]);
        assert_eq!(tree.reduce(&[1, 99]), Err(ReductionError::UnknownElement(99)));
        assert_eq!(tree.reduce(&[1, 2]), Err(ReductionError::Poisoned));
    }

    #[test]
    fn irreducible_poisons_and_sticks() {
        let mut tree = PQTree::new(&[1, 2, 3, 4]);
        tree.reduce(&[1, 2]).unwrap();
        tree.reduce(&[2, 3]).unwrap();
        assert_eq!(tree.reduce(&[1, 3]), Err(ReductionError::Irreducible));
        assert_eq!(tree.reduce(&[1, 2]), Err(ReductionError::Poisoned));
    }

    #[test]
    fn safe_reduce_rolls_back() {
        let mut tree = PQTree::new(&[1, 2, 3, 4]);
        tree.reduce(&[1, 2]).unwrap();
        tree.reduce(&[2, 3]).unwrap();
        let before_print = tree.print();
        let before_reductions = tree.reductions().to_vec();

        assert_eq!(tree.safe_reduce(&[1, 3]), Err(ReductionError::Irreducible));

        assert_eq!(tree.print(), before_print);
        assert_eq!(tree.reductions(), &before_reductions[..]);
        // and the tree is still usable
        tree.reduce(&[3, 4]).unwrap();
    }

    #[test]
    fn reduce_all_stops_at_first_failure() {
        let mut tree = PQTree::new(&[1, 2, 3, 4]);
        let sets = vec![vec![1, 2], vec![2, 3], vec![1, 3], vec![3, 4]];
        assert_eq!(tree.reduce_all(&sets), Err(ReductionError::Irreducible));
        assert_eq!(tree.reductions().len(), 2);
    }

    #[test]
    fn safe_reduce_all_is_atomic() {
        let mut tree = PQTree::new(&[1, 2, 3, 4]);
        let before = tree.print();
        let sets = vec![vec![1, 2], vec![2, 3], vec![1, 3]];
        assert!(tree.safe_reduce_all(&sets).is_err());
        assert_eq!(tree.print(), before);
        assert!(tree.reductions().is_empty());
    }

    #[test]
    fn duplicates_in_reduction_set_collapse() {
        let mut tree = PQTree::new(&[1, 2, 3, 4]);
        tree.reduce(&[2, 3, 2, 3]).unwrap();
        let out = tree.frontier();
        let pos2 = out.iter().position(|&v| v == 2).unwrap();
        let pos3 = out.iter().position(|&v| v == 3).unwrap();
        assert_eq!(pos2.abs_diff(pos3), 1);
    }
}
