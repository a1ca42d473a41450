//! A fixed-width 1-D binned histogram accumulator.

use crate::accumulator::Accumulator;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// A 1-D histogram with `bins` equal-width bins over `[lo, hi)` plus
/// underflow and overflow bins.
///
/// Fills take exactly one value per row. Each bin tracks both its sum of
/// weights and its sum of squared weights, so statistical errors survive
/// merging partial histograms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    bins: usize,
    lo: f64,
    hi: f64,
    /// Per-bin Σw; index 0 is underflow, `bins + 1` is overflow.
    sumw: Vec<f64>,
    /// Per-bin Σw².
    sumw2: Vec<f64>,
    entries: u64,
}

impl Histogram1D {
    /// `bins >= 1`, `lo < hi`, both finite.
    pub fn new(bins: usize, lo: f64, hi: f64) -> Result<Self> {
        if bins == 0 {
            bail!("histogram needs at least one bin");
        }
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            bail!("invalid histogram range [{lo}, {hi})");
        }
        Ok(Self {
            bins,
            lo,
            hi,
            sumw: vec![0.0; bins + 2],
            sumw2: vec![0.0; bins + 2],
            entries: 0,
        })
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Zero all bin contents, keeping the binning.
    pub fn reset(&mut self) {
        self.sumw.fill(0.0);
        self.sumw2.fill(0.0);
        self.entries = 0;
    }

    /// Storage index for a value: 0 for underflow, `bins + 1` for overflow
    /// (non-finite values land there too), else `1 + bin`.
    fn index_of(&self, x: f64) -> usize {
        if !x.is_finite() {
            return self.bins + 1;
        }
        if x < self.lo {
            return 0;
        }
        if x >= self.hi {
            return self.bins + 1;
        }
        let width = (self.hi - self.lo) / self.bins as f64;
        let bin = ((x - self.lo) / width) as usize;
        // Guard against float rounding at the upper edge.
        1 + bin.min(self.bins - 1)
    }

    /// Σw for in-range bin `bin` (0-based).
    #[must_use]
    pub fn bin_content(&self, bin: usize) -> f64 {
        self.sumw[1 + bin]
    }

    /// Σw² for in-range bin `bin` (0-based).
    #[must_use]
    pub fn bin_sumw2(&self, bin: usize) -> f64 {
        self.sumw2[1 + bin]
    }

    /// `[left_edge, right_edge)` of in-range bin `bin`.
    #[must_use]
    pub fn bin_edges(&self, bin: usize) -> (f64, f64) {
        let width = (self.hi - self.lo) / self.bins as f64;
        let left = self.lo + bin as f64 * width;
        (left, left + width)
    }

    #[must_use]
    pub fn underflow(&self) -> f64 {
        self.sumw[0]
    }

    #[must_use]
    pub fn overflow(&self) -> f64 {
        self.sumw[self.bins + 1]
    }

    /// Σw over the in-range bins.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.sumw[1..=self.bins].iter().sum()
    }

    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }
}

impl Accumulator for Histogram1D {
    fn empty_like(&self) -> Self {
        let mut h = self.clone();
        h.reset();
        h
    }

    fn fill(&mut self, values: &[f64], weight: f64) -> Result<()> {
        let [x] = values else {
            bail!("histogram fill expects exactly one value, got {}", values.len());
        };
        let i = self.index_of(*x);
        self.sumw[i] += weight;
        self.sumw2[i] += weight * weight;
        self.entries += 1;
        Ok(())
    }

    fn merge_from(&mut self, other: Self) -> Result<()> {
        if other.bins != self.bins || other.lo != self.lo || other.hi != self.hi {
            bail!(
                "cannot merge histograms with different binning: {} bins over [{}, {}) vs {} bins over [{}, {})",
                self.bins,
                self.lo,
                self.hi,
                other.bins,
                other.lo,
                other.hi
            );
        }
        for (w, v) in self.sumw.iter_mut().zip(&other.sumw) {
            *w += v;
        }
        for (w2, v) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *w2 += v;
        }
        self.entries += other.entries;
        Ok(())
    }
}
