#![cfg(feature = "parallel-driver")]

use anyhow::Result;
use floodgate::{Engine, EngineConfig, EventStream, WeightedSum, run_partitioned};

/// Real threads, one per lane, hammering one shared engine: conservation
/// must hold for every interleaving the scheduler produces.
#[test]
fn parallel_replay_conserves_every_fill() -> Result<()> {
    let workers = 4;
    let groups_per_worker = 50i64;
    let fills_per_group = 3;

    let streams: Vec<EventStream> = (0..workers)
        .map(|w| {
            let mut stream = EventStream::new();
            for g in 0..groups_per_worker {
                for _ in 0..fills_per_group {
                    stream.push((g, vec![(w + 1) as f64], 1.0));
                }
            }
            stream
        })
        .collect();

    let expected_entries = workers as u64 * groups_per_worker as u64 * fills_per_group as u64;
    // Per worker w: groups * fills * (w + 1).
    let expected_sum: f64 = (0..workers)
        .map(|w| (groups_per_worker * fills_per_group) as f64 * (w + 1) as f64)
        .sum();

    let engine = Engine::new(EngineConfig::new(workers), WeightedSum::new(1))?;
    run_partitioned(&engine, streams)?;

    let out = engine.into_result()?;
    assert_eq!(out.entries(), expected_entries);
    assert_eq!(out.sums(), &[expected_sum]);
    Ok(())
}

/// Lanes with disjoint group ranges still merge into one result; finalize
/// picks up whatever the watermark never released.
#[test]
fn skewed_lanes_drain_at_finalize() -> Result<()> {
    // Worker 0 only ever sees group 0; worker 1 walks 0..100.
    let streams = vec![
        vec![(0i64, vec![1.0], 1.0)],
        (0..100i64).map(|g| (g, vec![1.0], 1.0)).collect(),
    ];

    let engine = Engine::new(EngineConfig::new(2), WeightedSum::new(1))?;
    run_partitioned(&engine, streams)?;
    assert_eq!(engine.live_groups(), 0);
    assert_eq!(engine.into_result()?.entries(), 101);
    Ok(())
}

#[test]
fn stream_count_must_match_worker_count() -> Result<()> {
    let engine = Engine::new(EngineConfig::new(3), WeightedSum::new(1))?;
    let err = run_partitioned(&engine, vec![Vec::new(); 2]).unwrap_err();
    assert!(err.to_string().contains("3 workers"));
    Ok(())
}

/// A worker error (wrong row width here) aborts the run before finalize.
#[test]
fn worker_error_aborts_the_run() -> Result<()> {
    let streams = vec![
        vec![(0i64, vec![1.0, 2.0], 1.0)], // width 2 row into a width-1 sum
        vec![(0i64, vec![1.0], 1.0)],
    ];
    let engine = Engine::new(EngineConfig::new(2), WeightedSum::new(1))?;
    assert!(run_partitioned(&engine, streams).is_err());
    assert!(!engine.stats().finalized);
    Ok(())
}

#[test]
fn default_workers_is_positive() {
    assert!(floodgate::default_workers() >= 1);
}
