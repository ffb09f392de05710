use enum_map::Enum;

/// Sentinel index meaning "no node".
pub(crate) const NIL: usize = usize::MAX;

/// Body of an arena slot: what the node *is*.
///
/// A P-node only remembers one entry point into the circular list formed by
/// its children's [`Link::PChild`] records; a Q-node only remembers its two
/// endmost children and the interior is reached through sibling links.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Body {
    P { first: usize },
    Q { left: usize, right: usize },
    Leaf,
}

impl Body {
    pub(crate) fn p_first(&self) -> usize {
        match *self {
            Body::P { first } => first,
            other => panic!("not a P-node: {other:?}"),
        }
    }

    pub(crate) fn p_first_mut(&mut self) -> &mut usize {
        match self {
            Body::P { first } => first,
            other => panic!("not a P-node: {other:?}"),
        }
    }

    pub(crate) fn q_ends(&self) -> (usize, usize) {
        match *self {
            Body::Q { left, right } => (left, right),
            other => panic!("not a Q-node: {other:?}"),
        }
    }

    pub(crate) fn q_left_mut(&mut self) -> &mut usize {
        match self {
            Body::Q { left, .. } => left,
            other => panic!("not a Q-node: {other:?}"),
        }
    }

    pub(crate) fn q_right_mut(&mut self) -> &mut usize {
        match self {
            Body::Q { right, .. } => right,
            other => panic!("not a Q-node: {other:?}"),
        }
    }
}

/// How a node hangs off the rest of the tree.
///
/// Parent indices are authoritative for P-children and endmost Q-children
/// only. An interior Q-child carries a `parent_hint` that may be stale; the
/// bubble pass refreshes it before anything reads it (see
/// [`Slot::pertinent_parent`]).
#[derive(Debug, Copy, Clone)]
pub(crate) enum Link {
    /// The tree root, or a node currently detached from any parent.
    Top,
    /// Member of a P-node's circular child list.
    PChild { parent: usize, next: usize },
    /// Left endmost child of a Q-node.
    QLeft { parent: usize, right: usize },
    /// Right endmost child of a Q-node.
    QRight { parent: usize, left: usize },
    /// Interior child of a Q-node; `parent_hint` is weak.
    QMid { parent_hint: usize, left: usize, right: usize },
}

impl Link {
    /// Sibling one step to the right. Valid for left-end and interior
    /// Q-children.
    pub(crate) fn right(&self) -> usize {
        match *self {
            Link::QLeft { right, .. } | Link::QMid { right, .. } => right,
            other => panic!("no right sibling: {other:?}"),
        }
    }

    /// Sibling one step to the left. Valid for right-end and interior
    /// Q-children.
    pub(crate) fn left(&self) -> usize {
        match *self {
            Link::QRight { left, .. } | Link::QMid { left, .. } => left,
            other => panic!("no left sibling: {other:?}"),
        }
    }

    pub(crate) fn right_mut(&mut self) -> &mut usize {
        match self {
            Link::QLeft { right, .. } | Link::QMid { right, .. } => right,
            other => panic!("no right sibling: {other:?}"),
        }
    }

    pub(crate) fn left_mut(&mut self) -> &mut usize {
        match self {
            Link::QRight { left, .. } | Link::QMid { left, .. } => left,
            other => panic!("no left sibling: {other:?}"),
        }
    }

    pub(crate) fn p_next(&self) -> usize {
        match *self {
            Link::PChild { next, .. } => next,
            other => panic!("not a P-child: {other:?}"),
        }
    }

    pub(crate) fn p_next_mut(&mut self) -> &mut usize {
        match self {
            Link::PChild { next, .. } => next,
            other => panic!("not a P-child: {other:?}"),
        }
    }

    pub(crate) fn p_parent_mut(&mut self) -> &mut usize {
        match self {
            Link::PChild { parent, .. } => parent,
            other => panic!("not a P-child: {other:?}"),
        }
    }

    pub(crate) fn q_parent_mut(&mut self) -> &mut usize {
        match self {
            Link::QLeft { parent, .. } | Link::QRight { parent, .. } => parent,
            other => panic!("not an endmost Q-child: {other:?}"),
        }
    }

    /// Demote a left endmost child to interior after `left` was attached
    /// outside it. The old parent survives only as a hint.
    pub(crate) fn mid_with_left(&self, left: usize) -> Link {
        match *self {
            Link::QLeft { parent, right } => Link::QMid { parent_hint: parent, left, right },
            other => panic!("not a left end: {other:?}"),
        }
    }

    /// Demote a right endmost child to interior after `right` was attached
    /// outside it.
    pub(crate) fn mid_with_right(&self, right: usize) -> Link {
        match *self {
            Link::QRight { parent, left } => Link::QMid { parent_hint: parent, left, right },
            other => panic!("not a right end: {other:?}"),
        }
    }
}

/// Public classification of a node, for read-only tree inspection.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum NodeKind {
    P,
    Q,
    Leaf,
}

/// Bubble-pass state of a node.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone)]
pub(crate) enum NodeMark {
    #[default]
    Unmarked,
    Queued,
    Blocked,
    Unblocked,
}

/// Relation of a node's leaf set to the current reduction set.
///
/// A partial node is a Q-node whose full descendants form a prefix or
/// suffix of its frontier. The doubly-partial shape (full run strictly
/// inside) is never stored as a label: it is legal only at the pertinent
/// root, where the reduction ends and nobody asks.
#[derive(Debug, Default, Enum, Eq, PartialEq, Copy, Clone)]
pub(crate) enum NodeLabel {
    #[default]
    Empty,
    Full,
    Partial,
}

/// Per-reduction transient state. Reset on every node between reductions.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scratch {
    pub(crate) mark: NodeMark,
    pub(crate) label: NodeLabel,
    pub(crate) pertinent_children: usize,
    pub(crate) pertinent_leaves: usize,
}

/// One arena slot: body + parent/sibling linkage + reduction scratch.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) body: Body,
    pub(crate) link: Link,
    pub(crate) red: Scratch,
}

impl Slot {
    pub(crate) fn new(body: Body, link: Link) -> Slot {
        Slot { body, link, red: Scratch::default() }
    }

    /// Parent of a node that is known not to be blocked, or [`NIL`] for the
    /// tree root. The `QMid` hint is trusted here; the bubble pass
    /// guarantees it was refreshed when the node became unblocked.
    pub(crate) fn pertinent_parent(&self) -> usize {
        match self.link {
            Link::Top => NIL,
            Link::PChild { parent, .. }
            | Link::QLeft { parent, .. }
            | Link::QRight { parent, .. } => parent,
            Link::QMid { parent_hint, .. } => {
                debug_assert_ne!(self.red.mark, NodeMark::Blocked);
                parent_hint
            }
        }
    }
}

/// Iterates the children of a Q-node left to right.
///
/// Also serves the pseudo-node: its endmost indices delimit a run interior
/// to a real Q-node, and since the run's `QMid` links are left intact the
/// same left-to-right walk covers exactly the run.
pub(crate) struct QChildren<'a> {
    slots: &'a [Slot],
    next: Option<usize>,
    last: usize,
}

impl<'a> QChildren<'a> {
    pub(crate) fn new(slots: &'a [Slot], left: usize, right: usize) -> QChildren<'a> {
        QChildren { slots, next: Some(left), last: right }
    }
}

impl Iterator for QChildren<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = if current == self.last {
            None
        } else {
            Some(self.slots[current].link.right())
        };
        Some(current)
    }
}
