//! Matching of two variant sets of the same kind

use crate::histogram::QualityHistogram;
use crate::variant_set::VariantSet;
use crate::Quality;

/// Counts produced by one directional comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    /// Calls of the first set also present in the second
    pub matched: u64,
    /// Calls of the first set absent from the second
    pub unmatched: u64,
}

/// Where the qualities of the first set are recorded, split by outcome
pub struct HistogramSink<'a> {
    pub matched: &'a mut QualityHistogram,
    pub unmatched: &'a mut QualityHistogram,
}

impl HistogramSink<'_> {
    fn record(&mut self, matched: bool, quality: &Option<Quality>) {
        if let Some(quality) = quality {
            if matched {
                self.matched.record(quality);
            } else {
                self.unmatched.record(quality);
            }
        }
    }
}

/// Match every call of `calls` against `truth`.
///
/// A call matches when `truth` holds the same allele pair at the same locus.
/// Only the qualities of `calls` are ever recorded; calls loaded without
/// quality are counted but not recorded. Passing `None` as the sink skips
/// histogram bookkeeping entirely.
pub fn compare_sets(
    calls: &VariantSet,
    truth: &VariantSet,
    mut sink: Option<HistogramSink<'_>>,
) -> MatchCounts {
    let mut counts = MatchCounts::default();

    for (locus, locus_calls) in calls.loci() {
        match truth.calls_at(locus) {
            Some(truth_calls) => {
                for (alleles, quality) in locus_calls {
                    let matched = truth_calls.contains_key(alleles);
                    if matched {
                        counts.matched += 1;
                    } else {
                        counts.unmatched += 1;
                    }
                    if let Some(sink) = sink.as_mut() {
                        sink.record(matched, quality);
                    }
                }
            }
            None => {
                counts.unmatched += locus_calls.len() as u64;
                if let Some(sink) = sink.as_mut() {
                    for quality in locus_calls.values() {
                        sink.record(false, quality);
                    }
                }
            }
        }
    }

    counts
}
