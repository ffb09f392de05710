use thiserror::Error;

/// Why a reduction was rejected.
///
/// Any of these returned from [`PQTree::reduce`](crate::PQTree::reduce) or
/// [`PQTree::reduce_all`](crate::PQTree::reduce_all) leaves the tree
/// poisoned; the safe entry points roll back instead.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum ReductionError<T> {
    /// The reduction set mentions a value with no leaf in the tree.
    #[error("element {0:?} is not a leaf of this tree")]
    UnknownElement(T),
    /// The constraint cannot be embedded: either the bubble pass could not
    /// arrange the pertinent subtree, or no template matched some
    /// pertinent node.
    #[error("the tree admits no permutation with the given set consecutive")]
    Irreducible,
    /// An earlier non-safe reduction failed; every later call fails too.
    #[error("a failed reduction has invalidated this tree")]
    Poisoned,
}
