//! The watermark-gated aggregation engine.
//!
//! Parallel workers each replay a sub-stream of `(group, values, weight)`
//! events against [`Engine::record`]. Events sharing a group id may arrive
//! from several workers concurrently; each worker keeps its own private
//! accumulator per group (a *bucket slot*), so the fill path never contends
//! on accumulator state across workers.
//!
//! A per-worker *cursor* tracks the last group id that worker contributed
//! to. Group ids are non-decreasing per worker, so the minimum cursor over
//! all workers — the *watermark* — bounds the groups that can still receive
//! contributions: anything strictly below it is complete. When a worker's
//! cursor moves, completed buckets are *retired*: every per-worker partial
//! in the bucket is merged into the single shared result, in ascending group
//! order, and the bucket is evicted. [`Engine::finalize`] drains whatever is
//! left once the driver guarantees the stream has ended.
//!
//! Memory is bounded by worker skew: only groups between the slowest and
//! fastest worker's cursors stay live. A worker that stalls forever stalls
//! the watermark; [`Engine::stats`] exposes cursor skew for diagnosing that.

use crate::accumulator::Accumulator;
use crate::probe::{NoopProbe, Probe};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Logical tag shared by the events that must be summed together.
/// Legal ids are non-negative.
pub type GroupId = i64;

/// Index of one parallel execution lane, in `[0, workers)`.
pub type WorkerId = usize;

/// Cursor value before a worker has seen any group; below every legal id.
pub const UNSET_CURSOR: GroupId = -1;

/// Engine construction parameters.
///
/// The worker count is explicit here rather than read from ambient thread
/// pool state, so the concurrency level is visible at the call site.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of worker lanes; must be at least 1.
    pub workers: usize,
}

impl EngineConfig {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        #[cfg(feature = "parallel-driver")]
        let workers = crate::driver::default_workers();
        #[cfg(not(feature = "parallel-driver"))]
        let workers = 1;
        Self { workers }
    }
}

/// The operations a driver needs to push a finished stream through an
/// engine. Object-safe so drivers can hold `&dyn AggregationSink` without
/// caring about the accumulator type; the typed result accessors stay on
/// [`Engine`].
pub trait AggregationSink: Send + Sync {
    /// Push one weighted event for `worker`'s current group.
    fn record(&self, worker: WorkerId, group: GroupId, values: &[f64], weight: f64) -> Result<()>;

    /// Drain all remaining buckets; no `record` may follow.
    fn finalize(&self) -> Result<()>;
}

/// Point-in-time diagnostic snapshot of an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub workers: usize,
    /// Buckets currently held in memory.
    pub live_groups: usize,
    /// Minimum cursor over all workers ([`UNSET_CURSOR`] until every worker
    /// has recorded at least once).
    pub watermark: GroupId,
    pub last_retired: GroupId,
    pub cursors: Vec<GroupId>,
    /// Max − min over the cursors that are set; 0 when fewer than two are.
    pub cursor_skew: GroupId,
    pub groups_retired: u64,
    pub records: u64,
    pub finalized: bool,
}

impl EngineStats {
    /// JSON rendering for log lines and reports.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

struct EngineInner<A> {
    /// Live buckets: group id → (worker id → that worker's partial).
    /// Ordered so retirement walks groups in ascending id order.
    buckets: BTreeMap<GroupId, HashMap<WorkerId, A>>,
    /// Last group id each worker contributed to.
    cursors: Vec<GroupId>,
    /// Highest group id already merged into `result`.
    last_retired: GroupId,
    /// Shape template for `empty_like`.
    reference: A,
    /// The single shared aggregate; written only by retirement.
    result: A,
    finalized: bool,
    records: u64,
    groups_retired: u64,
}

/// A windowed, multi-worker aggregation engine.
///
/// Handles are cheap clones of one shared engine; give each worker thread
/// its own clone. Concurrent `record` calls from *distinct* worker ids are
/// fine; two concurrent calls sharing a worker id are a driver bug (the
/// cursor for that worker would race).
///
/// ```
/// use floodgate::{Engine, EngineConfig, WeightedSum};
///
/// # fn main() -> anyhow::Result<()> {
/// let engine = Engine::new(EngineConfig::new(2), WeightedSum::new(1))?;
/// engine.record(0, 0, &[2.0], 1.0)?;
/// engine.record(1, 0, &[3.0], 1.0)?;
/// engine.finalize()?;
/// assert_eq!(engine.result().sums(), &[5.0]);
/// # Ok(())
/// # }
/// ```
pub struct Engine<A: Accumulator> {
    inner: Arc<Mutex<EngineInner<A>>>,
    probe: Arc<dyn Probe>,
    workers: usize,
}

impl<A: Accumulator> Clone for Engine<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            probe: Arc::clone(&self.probe),
            workers: self.workers,
        }
    }
}

impl<A: Accumulator> Engine<A> {
    /// Create an engine with `config.workers` lanes. `reference` defines the
    /// accumulator shape: it seeds the shared result and is the template for
    /// every per-worker partial.
    pub fn new(config: EngineConfig, reference: A) -> Result<Self> {
        if config.workers == 0 {
            bail!("engine needs at least one worker");
        }
        let result = reference.empty_like();
        Ok(Self {
            inner: Arc::new(Mutex::new(EngineInner {
                buckets: BTreeMap::new(),
                cursors: vec![UNSET_CURSOR; config.workers],
                last_retired: UNSET_CURSOR,
                reference,
                result,
                finalized: false,
                records: 0,
                groups_retired: 0,
            })),
            probe: Arc::new(NoopProbe),
            workers: config.workers,
        })
    }

    /// Install an observability probe (no-op by default).
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Push one weighted event: fill `worker`'s partial for `group`, then
    /// advance the worker's cursor and retire whatever the watermark has
    /// passed.
    ///
    /// Preconditions, all surfaced as errors: the engine is not finalized,
    /// `worker` is in range, `group` is non-negative, not already retired,
    /// and not behind the worker's own cursor (group ids are non-decreasing
    /// per worker).
    pub fn record(&self, worker: WorkerId, group: GroupId, values: &[f64], weight: f64) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        if guard.finalized {
            bail!("record called after finalize");
        }
        if worker >= self.workers {
            bail!("worker id {worker} out of range ({} workers configured)", self.workers);
        }
        if group < 0 {
            bail!("negative group id {group}");
        }
        if group <= guard.last_retired {
            bail!(
                "group {group} was already retired (last retired: {})",
                guard.last_retired
            );
        }
        let cursor = guard.cursors[worker];
        if group < cursor {
            bail!("worker {worker} went backwards: group {group} after cursor {cursor}");
        }

        let inner = &mut *guard;
        let EngineInner { buckets, reference, .. } = inner;
        let slot = buckets
            .entry(group)
            .or_default()
            .entry(worker)
            // First contact for this (group, worker): clone an empty partial
            // off the reference. Repeat calls fill the existing partial so
            // contributions accumulate, never reset.
            .or_insert_with(|| reference.empty_like());
        slot.fill(values, weight)?;
        inner.records += 1;
        self.probe.on_record(worker, group);

        if group != cursor {
            // Cursor transition. Retire against the cursor set as it stood
            // before this worker's move: those groups are already complete,
            // and the move itself can only raise the watermark further.
            Self::retire_ready(inner, &self.probe)?;
            inner.cursors[worker] = group;
        }
        Ok(())
    }

    /// Merge every bucket below the current watermark into the result.
    /// No-op while `last_retired` already sits at `watermark - 1`.
    fn retire_ready(inner: &mut EngineInner<A>, probe: &Arc<dyn Probe>) -> Result<()> {
        let watermark = inner.cursors.iter().copied().min().unwrap_or(UNSET_CURSOR);
        if inner.last_retired >= watermark - 1 {
            return Ok(());
        }
        Self::drain(inner, probe, Some(watermark))
    }

    /// Retire every bucket with group id below `bound` (every bucket when
    /// `bound` is `None`), ascending, merging each bucket's per-worker
    /// partials into the shared result and evicting it.
    fn drain(inner: &mut EngineInner<A>, probe: &Arc<dyn Probe>, bound: Option<GroupId>) -> Result<()> {
        while let Some((group, bucket)) = inner.buckets.pop_first() {
            if bound.is_some_and(|b| group >= b) {
                // Not complete yet; put it back and stop (ids are ascending).
                inner.buckets.insert(group, bucket);
                break;
            }
            let contributors = bucket.len();
            for (_, partial) in bucket {
                inner.result.merge_from(partial)?;
            }
            inner.last_retired = group;
            inner.groups_retired += 1;
            probe.on_retire(group, contributors);
        }
        Ok(())
    }

    /// Drain every remaining bucket into the result, watermark regardless:
    /// once the stream has ended, every live group is complete. Must be
    /// called exactly once, after the last `record`.
    pub fn finalize(&self) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        if guard.finalized {
            bail!("finalize called twice");
        }
        let inner = &mut *guard;
        Self::drain(inner, &self.probe, None)?;
        inner.finalized = true;
        self.probe.on_finalize(inner.groups_retired);
        Ok(())
    }

    /// Number of buckets currently held in memory.
    #[must_use]
    pub fn live_groups(&self) -> usize {
        self.inner.lock().unwrap().buckets.len()
    }

    /// Diagnostic snapshot of cursors, watermark, and counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let guard = self.inner.lock().unwrap();
        let set: Vec<GroupId> = guard.cursors.iter().copied().filter(|c| *c != UNSET_CURSOR).collect();
        let cursor_skew = match (set.iter().max(), set.iter().min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };
        EngineStats {
            workers: self.workers,
            live_groups: guard.buckets.len(),
            watermark: guard.cursors.iter().copied().min().unwrap_or(UNSET_CURSOR),
            last_retired: guard.last_retired,
            cursors: guard.cursors.clone(),
            cursor_skew,
            groups_retired: guard.groups_retired,
            records: guard.records,
            finalized: guard.finalized,
        }
    }
}

impl<A: Accumulator + Clone> Engine<A> {
    /// Snapshot of the shared result. Valid at any time; before
    /// [`finalize`](Engine::finalize) it reflects only the groups retired so
    /// far, which makes it a progress peek, not a correct final aggregate.
    #[must_use]
    pub fn result(&self) -> A {
        self.inner.lock().unwrap().result.clone()
    }
}

impl<A: Accumulator> Engine<A> {
    /// Consume the engine and hand back the final aggregate without a clone.
    /// Fails if the engine was never finalized or other handles are still
    /// alive.
    pub fn into_result(self) -> Result<A> {
        let Some(mutex) = Arc::into_inner(self.inner) else {
            bail!("other engine handles are still alive");
        };
        let inner = match mutex.into_inner() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !inner.finalized {
            bail!("into_result called before finalize");
        }
        Ok(inner.result)
    }
}

impl<A: Accumulator> AggregationSink for Engine<A> {
    fn record(&self, worker: WorkerId, group: GroupId, values: &[f64], weight: f64) -> Result<()> {
        Engine::record(self, worker, group, values, weight)
    }

    fn finalize(&self) -> Result<()> {
        Engine::finalize(self)
    }
}
