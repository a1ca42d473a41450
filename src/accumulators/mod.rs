//! Ready-made [`Accumulator`](crate::Accumulator) implementations.
//!
//! The engine is generic over the accumulator, but most drivers want one of
//! these: a binned histogram, a per-column weighted sum, or scalar weighted
//! moments.

pub mod basic;
pub mod histogram;

pub use basic::{WeightedStats, WeightedSum};
pub use histogram::Histogram1D;
