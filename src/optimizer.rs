//! Search for the (percentage, score) filter that maximizes a
//! precision/recall trade-off, one depth bucket at a time.
//!
//! A filter `(P, S)` accepts calls with `percentage >= P` and `score <= S`.
//! Candidates are swept with `P` descending from 100 and `S` ascending from
//! 10 to 40, so the accepted region of each candidate is obtained from already
//! computed neighbours by inclusion-exclusion:
//!
//! ```text
//! region(P, S) = region(P + 1, S) + region(P, S - 1) - region(P + 1, S - 1) + count(P, S)
//! ```
//!
//! with `region(101, _) = region(_, 9) = 0`.

use crate::histogram::{DepthSlice, OutcomeHistograms, DEPTH_LIMIT};

/// Highest percentage a filter may require
pub const MAX_PERCENTAGE: u8 = 100;
/// Lowest score bound considered as a candidate
pub const MIN_CANDIDATE_SCORE: u8 = 10;
/// Highest score bound; the histogram caps scores here
pub const MAX_SCORE: u8 = 40;

const SCORE_ANCHOR: u8 = MIN_CANDIDATE_SCORE - 1;
const ROWS: usize = MAX_PERCENTAGE as usize + 2;
const COLUMNS: usize = (MAX_SCORE - SCORE_ANCHOR) as usize + 1;

/// `precision^tp_power * recall`, or 0 when either ratio is undefined
pub fn score_fn(tp: u64, fp: u64, tp_total: u64, tp_power: f64) -> f64 {
    if tp + fp == 0 || tp_total == 0 {
        return 0.0;
    }
    let precision = tp as f64 / (tp + fp) as f64;
    let recall = tp as f64 / tp_total as f64;
    precision.powf(tp_power) * recall
}

/// Filter rule `percentage >= self.percentage && score <= self.score`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThresholdCandidate {
    pub percentage: u8,
    pub score: u8,
}

impl ThresholdCandidate {
    /// Rejects every call; the starting point of each search
    pub const ACCEPT_NOTHING: ThresholdCandidate = ThresholdCandidate {
        percentage: MAX_PERCENTAGE,
        score: 0,
    };

    pub fn new(percentage: u8, score: u8) -> Self {
        Self { percentage, score }
    }
}

/// Region sums over `percentage in [P, 100]`, `score in [10, S]`
#[derive(Debug, Clone)]
pub struct RegionSums {
    cells: Vec<u64>,
}

impl RegionSums {
    fn new() -> Self {
        Self {
            cells: vec![0; ROWS * COLUMNS],
        }
    }

    fn index(percentage: u8, score: u8) -> usize {
        percentage as usize * COLUMNS + (score - SCORE_ANCHOR) as usize
    }

    /// Sum for `(percentage, score)`, valid once the sweep has passed it.
    /// Outside the swept range this is 0.
    pub fn get(&self, percentage: u8, score: u8) -> u64 {
        if percentage as usize >= ROWS || !(SCORE_ANCHOR..=MAX_SCORE).contains(&score) {
            return 0;
        }
        self.cells[Self::index(percentage, score)]
    }

    /// Extend the sums by one cell. `(percentage + 1, score)` and
    /// `(percentage, score - 1)` must already be filled.
    fn accumulate(&mut self, percentage: u8, score: u8, count: u64) -> u64 {
        let value = self.get(percentage + 1, score) + self.get(percentage, score - 1) + count
            - self.get(percentage + 1, score - 1);
        self.cells[Self::index(percentage, score)] = value;
        value
    }
}

/// Full candidate sweep of one depth bucket
#[derive(Debug, Clone)]
pub struct DepthSweep {
    pub tp_region: RegionSums,
    pub fp_region: RegionSums,
    pub best: ThresholdCandidate,
    pub best_value: f64,
}

impl DepthSweep {
    /// Sweep every candidate and keep the first one strictly beating the
    /// best so far. The search starts from `ACCEPT_NOTHING` valued as a
    /// 50% precision / 50% recall call set, so a winner must beat that.
    pub fn run(tp: &DepthSlice, fp: &DepthSlice, tp_power: f64) -> Self {
        let tp_total = tp.total();
        let mut sweep = DepthSweep {
            tp_region: RegionSums::new(),
            fp_region: RegionSums::new(),
            best: ThresholdCandidate::ACCEPT_NOTHING,
            best_value: score_fn(1, 1, 2, tp_power),
        };

        for percentage in (1..=MAX_PERCENTAGE).rev() {
            for score in MIN_CANDIDATE_SCORE..=MAX_SCORE {
                let tp_count = tp.get(percentage, score);
                let fp_count = fp.get(percentage, score);
                let tp_accepted = sweep.tp_region.accumulate(percentage, score, tp_count);
                let fp_accepted = sweep.fp_region.accumulate(percentage, score, fp_count);

                let value = score_fn(tp_accepted, fp_accepted, tp_total, tp_power);
                if value > sweep.best_value {
                    sweep.best = ThresholdCandidate::new(percentage, score);
                    sweep.best_value = value;
                }
            }
        }

        sweep
    }
}

/// Best filter of one depth bucket and the counts it keeps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthFilter {
    pub depth: u8,
    pub candidate: ThresholdCandidate,
    pub value: f64,
    /// True positives accepted by the filter
    pub tp: u64,
    /// False positives accepted by the filter
    pub fp: u64,
    /// All true positives of the bucket
    pub tp_total: u64,
}

/// Best filter for `depth`.
///
/// The accepted counts are taken from the full histogram slice rather than
/// from the sweep, so scores below the candidate range are included.
pub fn best_filter_for_depth(
    histograms: &OutcomeHistograms,
    depth: u8,
    tp_power: f64,
) -> DepthFilter {
    let tp = histograms.tp.depth_slice(depth);
    let fp = histograms.fp.depth_slice(depth);
    let sweep = DepthSweep::run(&tp, &fp, tp_power);
    let candidate = sweep.best;

    DepthFilter {
        depth,
        candidate,
        value: sweep.best_value,
        tp: tp.accepted(candidate.percentage, candidate.score),
        fp: fp.accepted(candidate.percentage, candidate.score),
        tp_total: tp.total(),
    }
}

/// Filters chosen for every depth bucket under one exponent
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSearch {
    pub tp_power: f64,
    pub depths: Vec<DepthFilter>,
    /// True positives kept over all depths
    pub tp: u64,
    /// False positives kept over all depths
    pub fp: u64,
}

/// Pick the best filter of each depth bucket for `tp_power`
pub fn search_filters(histograms: &OutcomeHistograms, tp_power: f64) -> FilterSearch {
    let depths: Vec<DepthFilter> = (0..DEPTH_LIMIT as u8)
        .map(|depth| {
            let filter = best_filter_for_depth(histograms, depth, tp_power);
            log::debug!(
                "tp_power={} depth={} filter=({}, {}) tp={} fp={} value={:.4}",
                tp_power,
                depth,
                filter.candidate.percentage,
                filter.candidate.score,
                filter.tp,
                filter.fp,
                filter.value
            );
            filter
        })
        .collect();

    FilterSearch {
        tp_power,
        tp: depths.iter().map(|d| d.tp).sum(),
        fp: depths.iter().map(|d| d.fp).sum(),
        depths,
    }
}
