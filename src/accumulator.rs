//! The accumulator contract the engine aggregates through.
//!
//! The engine never inspects what an accumulator holds; it only needs to
//! clone an empty instance of the right shape, push weighted value rows into
//! it, and fold one instance into another. Anything that can do those three
//! things — a binned histogram, a running-moments tracker, a plain weighted
//! sum — can be the payload of an [`Engine`](crate::Engine).
//!
//! Shape (binning, row width, ...) is fixed by the reference instance handed
//! to the engine at construction; `fill` and `merge_from` report shape
//! mismatches as errors and the engine propagates them unchanged.

use anyhow::Result;

/// A mergeable, weight-aware aggregate.
///
/// Implementations must be `Send` so per-worker partials can live on worker
/// threads. Merging must be commutative and associative with respect to the
/// final aggregate: the engine gives no guarantee about the order in which
/// one group's per-worker partials are folded together.
pub trait Accumulator: Send + 'static {
    /// A new, empty accumulator with the same shape as `self`.
    fn empty_like(&self) -> Self
    where
        Self: Sized;

    /// Add one weighted row of values.
    fn fill(&mut self, values: &[f64], weight: f64) -> Result<()>;

    /// Fold `other` into `self`. Both sides must share a shape.
    fn merge_from(&mut self, other: Self) -> Result<()>
    where
        Self: Sized;
}
