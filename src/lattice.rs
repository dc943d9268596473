//! The abstraction contract shared by every analysis domain.
//!
//! A domain exposes exactly four operations to the fixpoint driver: a bottom
//! element, join, the per-statement transfer function, and structural
//! equality (via `PartialEq` on the element type). Domains are otherwise
//! opaque to the driver.

use std::fmt::Debug;

use crate::ir::StmtId;

/// An abstract domain over a join-semilattice of elements.
///
/// # Laws
///
/// - `join` is commutative, associative and idempotent, and `bottom` is its
///   identity: `join(bottom, x) = x`.
/// - `transfer` annihilates bottom: `transfer(bottom, ..) = bottom`.
/// - `transfer` is monotone: joining inputs never makes an output more
///   precise.
///
/// Elements are immutable values; both operations return new elements, so
/// the driver's equality-based fixpoint test and trace retention are safe.
pub trait Domain {
    /// Abstract value attached to a program point.
    type Element: Clone + Debug + PartialEq;

    /// The least element: an unreachable/contradictory state.
    fn bottom(&self) -> Self::Element;

    /// Least upper bound of two elements.
    fn join(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Abstract effect of executing `stmt` on `elem`.
    ///
    /// `on_true` selects the branch of a conditional statement and is
    /// meaningless (and ignored) for every other statement shape.
    fn transfer(&self, elem: &Self::Element, stmt: StmtId, on_true: bool) -> Self::Element;
}
