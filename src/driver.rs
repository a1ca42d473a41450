//! Rayon-backed convenience driver: one thread per worker lane.
//!
//! The engine itself never spawns threads; it only reacts to `record` calls.
//! Most drivers, though, just want to replay N pre-partitioned event streams
//! in parallel and collect the merged result, which is what
//! [`run_partitioned`] does. Anything fancier (pulling events off a queue,
//! embedding in an existing pool) can call
//! [`Engine::record`](crate::Engine::record) directly; engine handles are
//! cheap clones.

use crate::accumulator::Accumulator;
use crate::engine::{Engine, GroupId};
use anyhow::{Result, bail};
use rayon::prelude::*;

/// Default worker count: one lane per logical CPU.
#[must_use]
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// One worker lane's replay stream: `(group, values, weight)` events with
/// non-decreasing group ids.
pub type EventStream = Vec<(GroupId, Vec<f64>, f64)>;

/// Replay one stream per worker lane against `engine`, each on its own
/// thread, then finalize. `streams.len()` must equal the engine's worker
/// count; stream `i` is replayed as worker `i`, preserving the
/// single-writer-per-worker rule.
///
/// A worker error aborts the run and leaves the engine unfinalized.
pub fn run_partitioned<A: Accumulator>(engine: &Engine<A>, streams: Vec<EventStream>) -> Result<()> {
    if streams.len() != engine.workers() {
        bail!(
            "{} streams for an engine with {} workers",
            streams.len(),
            engine.workers()
        );
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(streams.len().max(1))
        .build()?;
    pool.install(|| {
        streams
            .into_par_iter()
            .enumerate()
            .try_for_each(|(worker, stream)| {
                for (group, values, weight) in stream {
                    engine.record(worker, group, &values, weight)?;
                }
                Ok::<(), anyhow::Error>(())
            })
    })?;
    engine.finalize()
}
