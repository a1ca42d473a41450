//! Simple numeric accumulators: weighted sums and weighted moments.

use crate::accumulator::Accumulator;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/* ===================== WeightedSum ===================== */

/// Per-column weighted sums over fixed-width value rows.
///
/// Every fill must supply exactly `width` values; column `i` accumulates
/// `weight * values[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedSum {
    sums: Vec<f64>,
    sum_weights: f64,
    entries: u64,
}

impl WeightedSum {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            sums: vec![0.0; width],
            sum_weights: 0.0,
            entries: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.sums.len()
    }

    #[must_use]
    pub fn sums(&self) -> &[f64] {
        &self.sums
    }

    #[must_use]
    pub fn sum_weights(&self) -> f64 {
        self.sum_weights
    }

    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }
}

impl Accumulator for WeightedSum {
    fn empty_like(&self) -> Self {
        Self::new(self.width())
    }

    fn fill(&mut self, values: &[f64], weight: f64) -> Result<()> {
        if values.len() != self.width() {
            bail!(
                "weighted sum of width {} filled with {} values",
                self.width(),
                values.len()
            );
        }
        for (sum, v) in self.sums.iter_mut().zip(values) {
            *sum += weight * v;
        }
        self.sum_weights += weight;
        self.entries += 1;
        Ok(())
    }

    fn merge_from(&mut self, other: Self) -> Result<()> {
        if other.width() != self.width() {
            bail!(
                "cannot merge weighted sums of width {} and {}",
                self.width(),
                other.width()
            );
        }
        for (sum, v) in self.sums.iter_mut().zip(&other.sums) {
            *sum += v;
        }
        self.sum_weights += other.sum_weights;
        self.entries += other.entries;
        Ok(())
    }
}

/* ===================== WeightedStats ===================== */

/// Weighted mean and variance of a scalar, tracked as merge-friendly raw
/// moments (Σw, Σwx, Σwx²).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedStats {
    entries: u64,
    sum_w: f64,
    sum_wx: f64,
    sum_wx2: f64,
}

impl WeightedStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    #[must_use]
    pub fn sum_weights(&self) -> f64 {
        self.sum_w
    }

    /// Weighted mean; 0.0 when nothing has been filled.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.sum_w == 0.0 { 0.0 } else { self.sum_wx / self.sum_w }
    }

    /// Weighted population variance; 0.0 when nothing has been filled.
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.sum_w == 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_wx2 / self.sum_w - mean * mean).max(0.0)
    }
}

impl Accumulator for WeightedStats {
    fn empty_like(&self) -> Self {
        Self::default()
    }

    fn fill(&mut self, values: &[f64], weight: f64) -> Result<()> {
        let [x] = values else {
            bail!("weighted stats expect exactly one value, got {}", values.len());
        };
        self.entries += 1;
        self.sum_w += weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;
        Ok(())
    }

    fn merge_from(&mut self, other: Self) -> Result<()> {
        self.entries += other.entries;
        self.sum_w += other.sum_w;
        self.sum_wx += other.sum_wx;
        self.sum_wx2 += other.sum_wx2;
        Ok(())
    }
}
