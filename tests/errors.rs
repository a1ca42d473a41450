//! Driver-bug surfaces: every precondition violation is an error, never a
//! silent no-op.

use anyhow::Result;
use floodgate::{Engine, EngineConfig, WeightedSum};

fn engine(workers: usize) -> Result<Engine<WeightedSum>> {
    Engine::new(EngineConfig::new(workers), WeightedSum::new(1))
}

#[test]
fn zero_workers_is_rejected_at_construction() {
    assert!(Engine::new(EngineConfig::new(0), WeightedSum::new(1)).is_err());
}

#[test]
fn out_of_range_worker_id() -> Result<()> {
    let e = engine(2)?;
    let err = e.record(2, 0, &[1.0], 1.0).unwrap_err();
    assert!(err.to_string().contains("out of range"));
    Ok(())
}

#[test]
fn negative_group_id() -> Result<()> {
    let e = engine(1)?;
    assert!(e.record(0, -1, &[1.0], 1.0).is_err());
    Ok(())
}

#[test]
fn record_after_finalize_is_a_fault() -> Result<()> {
    let e = engine(1)?;
    e.record(0, 0, &[1.0], 1.0)?;
    e.finalize()?;
    let err = e.record(0, 1, &[1.0], 1.0).unwrap_err();
    assert!(err.to_string().contains("finalize"));
    Ok(())
}

#[test]
fn finalize_twice_is_a_fault() -> Result<()> {
    let e = engine(1)?;
    e.finalize()?;
    assert!(e.finalize().is_err());
    Ok(())
}

/// A worker's group ids must be non-decreasing; going backwards would
/// silently corrupt the watermark, so it faults instead.
#[test]
fn backwards_group_within_a_worker() -> Result<()> {
    let e = engine(2)?;
    e.record(0, 5, &[1.0], 1.0)?;
    let err = e.record(0, 4, &[1.0], 1.0).unwrap_err();
    assert!(err.to_string().contains("backwards"));
    Ok(())
}

/// A retired group id never comes back: its bucket would otherwise be
/// re-created and never retired again.
#[test]
fn re_arrival_of_a_retired_group() -> Result<()> {
    let e = engine(1)?;
    e.record(0, 0, &[1.0], 1.0)?;
    e.record(0, 1, &[1.0], 1.0)?;
    e.record(0, 2, &[1.0], 1.0)?; // transition retires group 0
    let err = e.record(0, 0, &[1.0], 1.0).unwrap_err();
    assert!(err.to_string().contains("already retired"));
    Ok(())
}

/// Accumulator shape errors propagate out of `record` unchanged; the engine
/// adds no recovery of its own.
#[test]
fn fill_shape_mismatch_propagates() -> Result<()> {
    let e = Engine::new(EngineConfig::new(1), WeightedSum::new(2))?;
    let err = e.record(0, 0, &[1.0], 1.0).unwrap_err();
    assert!(err.to_string().contains("width 2"));
    Ok(())
}

#[test]
fn into_result_requires_finalize() -> Result<()> {
    let e = engine(1)?;
    e.record(0, 0, &[1.0], 1.0)?;
    assert!(e.into_result().is_err());
    Ok(())
}
