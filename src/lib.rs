//! # Floodgate
//!
//! A **watermark-gated, multi-worker aggregation engine**: parallel workers
//! each produce a stream of group-tagged, weighted events, and every group's
//! events are summed into one global result exactly once — no loss, no
//! double counting — even though workers proceed at uncoordinated speeds and
//! several workers may still be contributing to the same group at once.
//!
//! ## How it works
//!
//! Each worker gets a private partial accumulator per live group, so the
//! fill path never contends across workers. Group ids are non-decreasing
//! within a worker's stream, so the minimum over all workers' cursors (the
//! *watermark*) separates groups that may still grow from groups that are
//! complete. Complete groups are *retired*: merged into the shared result in
//! ascending group order and evicted, keeping memory bounded by worker skew.
//!
//! ## Quick start
//!
//! ```
//! use floodgate::{Engine, EngineConfig, Histogram1D};
//!
//! # fn main() -> anyhow::Result<()> {
//! let reference = Histogram1D::new(20, 0.0, 100.0)?;
//! let engine = Engine::new(EngineConfig::new(2), reference)?;
//!
//! // Two workers contribute to group 0, then move on.
//! engine.record(0, 0, &[12.5], 1.0)?;
//! engine.record(1, 0, &[47.0], 0.5)?;
//! engine.record(0, 1, &[63.0], 1.0)?;
//! engine.record(1, 1, &[88.0], 1.0)?;
//!
//! engine.finalize()?;
//! let histo = engine.into_result()?;
//! assert_eq!(histo.entries(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core pieces
//!
//! - [`Engine`] — `record` / `finalize` / `result`, generic over the
//!   aggregate payload.
//! - [`Accumulator`] — the payload contract: `empty_like`, weighted `fill`,
//!   `merge_from`. The engine never inspects accumulator contents.
//! - [`accumulators`] — ready-made payloads: [`Histogram1D`],
//!   [`WeightedSum`], [`WeightedStats`].
//! - [`Probe`] — injectable observability hook, no-op by default.
//! - [`driver`] *(feature `parallel-driver`, on by default)* — rayon
//!   convenience driver replaying pre-partitioned streams, one thread per
//!   worker lane.
//!
//! The engine does not decide how work is partitioned, does not guarantee
//! global event ordering, and does no binning or statistics of its own —
//! those belong to the driver and the accumulator.

pub mod accumulator;
pub mod accumulators;
pub mod engine;
pub mod probe;

#[cfg(feature = "parallel-driver")]
pub mod driver;

pub use accumulator::Accumulator;
pub use accumulators::{Histogram1D, WeightedStats, WeightedSum};
pub use engine::{
    AggregationSink, Engine, EngineConfig, EngineStats, GroupId, UNSET_CURSOR, WorkerId,
};
pub use probe::{NoopProbe, Probe, RetirementLog};

#[cfg(feature = "parallel-driver")]
pub use driver::{EventStream, default_workers, run_partitioned};
