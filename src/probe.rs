//! Injectable engine observability.
//!
//! The engine's hot path carries no logging of its own; instead a [`Probe`]
//! installed via [`Engine::with_probe`](crate::Engine::with_probe) receives
//! structured callbacks. The default [`NoopProbe`] costs nothing beyond the
//! virtual call. Callbacks run while the engine lock is held, so probes
//! should stay cheap and must not call back into the engine.

use crate::engine::{GroupId, WorkerId};
use std::sync::Mutex;

/// Structured event hooks for engine activity. Every callback has an empty
/// default body; implement only what you need.
pub trait Probe: Send + Sync {
    /// A weighted event was accepted into `worker`'s partial for `group`.
    fn on_record(&self, _worker: WorkerId, _group: GroupId) {}

    /// `group` was merged into the shared result (from `contributors`
    /// per-worker partials) and its bucket evicted.
    fn on_retire(&self, _group: GroupId, _contributors: usize) {}

    /// The engine finished draining; `groups_retired` groups were merged
    /// over its lifetime.
    fn on_finalize(&self, _groups_retired: u64) {}
}

/// The default probe: ignores everything.
pub struct NoopProbe;

impl Probe for NoopProbe {}

/// A probe that records each retirement in order. Handy for asserting
/// retirement order and exactly-once merging in tests, and for offline
/// inspection of a run.
#[derive(Default)]
pub struct RetirementLog {
    entries: Mutex<Vec<(GroupId, usize)>>,
}

impl RetirementLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(group, contributors)` pairs in the order groups were retired.
    #[must_use]
    pub fn entries(&self) -> Vec<(GroupId, usize)> {
        self.entries.lock().unwrap().clone()
    }

    /// Just the retired group ids, in retirement order.
    #[must_use]
    pub fn groups(&self) -> Vec<GroupId> {
        self.entries.lock().unwrap().iter().map(|(g, _)| *g).collect()
    }
}

impl Probe for RetirementLog {
    fn on_retire(&self, group: GroupId, contributors: usize) {
        self.entries.lock().unwrap().push((group, contributors));
    }
}
