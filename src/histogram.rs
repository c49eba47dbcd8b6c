//! Sparse (depth, percentage, score) frequency tables for compared calls

use crate::Quality;
use std::collections::HashMap;

/// Number of depth buckets; the last one holds every depth >= 20
pub const DEPTH_LIMIT: usize = 21;
/// Number of percentage buckets; the last one holds every percentage >= 99
pub const PERCENTAGE_LIMIT: usize = 100;
/// Number of score buckets; the last one holds every score >= 40
pub const SCORE_LIMIT: usize = 41;

/// Number of rows in the per-axis summary
pub const MARGINAL_ROWS: usize = 100;

/// Clamped histogram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistogramKey {
    pub depth: u8,
    pub percentage: u8,
    pub score: u8,
}

impl HistogramKey {
    pub fn clamped(quality: &Quality) -> Self {
        Self {
            depth: clamp(quality.depth, DEPTH_LIMIT),
            percentage: clamp(quality.percentage, PERCENTAGE_LIMIT),
            score: clamp(quality.score, SCORE_LIMIT),
        }
    }
}

fn clamp(value: u32, limit: usize) -> u8 {
    value.min(limit as u32 - 1) as u8
}

/// Occurrence counts keyed by clamped quality
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityHistogram {
    counts: HashMap<HistogramKey, u64>,
}

impl QualityHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, quality: &Quality) {
        *self.counts.entry(HistogramKey::clamped(quality)).or_insert(0) += 1;
    }

    pub fn count(&self, key: &HistogramKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Project the entries of one depth bucket onto (percentage, score)
    pub fn depth_slice(&self, depth: u8) -> DepthSlice {
        let mut slice = DepthSlice::default();
        for (key, &count) in self.counts.iter().filter(|(key, _)| key.depth == depth) {
            *slice.counts.entry((key.percentage, key.score)).or_insert(0) += count;
            slice.total += count;
        }
        slice
    }

    /// Per-axis distributions, one row per bucket index
    pub fn marginals(&self) -> Marginals {
        let mut marginals = Marginals {
            depth: vec![0; MARGINAL_ROWS],
            percentage: vec![0; MARGINAL_ROWS],
            score: vec![0; MARGINAL_ROWS],
        };
        for (key, &count) in &self.counts {
            marginals.depth[key.depth as usize] += count;
            marginals.percentage[key.percentage as usize] += count;
            marginals.score[key.score as usize] += count;
        }
        marginals
    }
}

/// The (percentage, score) counts of one depth bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthSlice {
    counts: HashMap<(u8, u8), u64>,
    total: u64,
}

impl DepthSlice {
    pub fn get(&self, percentage: u8, score: u8) -> u64 {
        self.counts.get(&(percentage, score)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Count the entries accepted by `percentage >= min_percentage && score <= max_score`
    pub fn accepted(&self, min_percentage: u8, max_score: u8) -> u64 {
        self.counts
            .iter()
            .filter(|((percentage, score), _)| *percentage >= min_percentage && *score <= max_score)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Histograms filled during one test-versus-reference comparison
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeHistograms {
    pub tp: QualityHistogram,
    pub fp: QualityHistogram,
}

impl OutcomeHistograms {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-axis counts of a histogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marginals {
    pub depth: Vec<u64>,
    pub percentage: Vec<u64>,
    pub score: Vec<u64>,
}
