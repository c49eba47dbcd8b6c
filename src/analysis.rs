//! Per-kind evaluation of a test call set against a reference call set

use crate::compare::{compare_sets, HistogramSink};
use crate::histogram::OutcomeHistograms;
use crate::optimizer::{search_filters, FilterSearch};
use crate::variant_set::{VariantSet, VariantSets};
use crate::{CompareConfig, VariantKind};
use std::fmt;

/// Outcome counts of a test set against a reference set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accuracy {
    /// Test calls found in the reference
    pub tp: u64,
    /// Test calls absent from the reference
    pub fp: u64,
    /// Reference calls absent from the test set
    pub fn_: u64,
    /// Reference calls found in the test set
    pub cm: u64,
    pub test_total: u64,
    pub reference_total: u64,
}

/// A cross-check between the two comparison directions that did not hold.
/// These are reported but never stop the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// Matches counted from the test side and the reference side differ
    TpConfirmedMismatch { tp: u64, cm: u64 },
    /// `tp + fp` differs from the number of test records
    TestTotalMismatch { tp: u64, fp: u64, total: u64 },
    /// `cm + fn` differs from the number of reference records
    ReferenceTotalMismatch { cm: u64, fn_: u64, total: u64 },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::TpConfirmedMismatch { tp, cm } => {
                write!(f, "ERROR while computing TP and CM (tp={}, cm={})", tp, cm)
            }
            ConsistencyIssue::TestTotalMismatch { tp, fp, total } => write!(
                f,
                "ERROR while computing TP and FP (tp={} + fp={} != {})",
                tp, fp, total
            ),
            ConsistencyIssue::ReferenceTotalMismatch { cm, fn_, total } => write!(
                f,
                "ERROR while computing CM and FN (cm={} + fn={} != {})",
                cm, fn_, total
            ),
        }
    }
}

/// Accuracy left after applying the filters chosen for one exponent
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredAccuracy {
    pub search: FilterSearch,
    pub accuracy: Accuracy,
    pub issues: Vec<ConsistencyIssue>,
}

/// Everything computed for one variant kind
#[derive(Debug, Clone)]
pub struct KindEvaluation {
    pub kind: VariantKind,
    pub accuracy: Accuracy,
    pub issues: Vec<ConsistencyIssue>,
    /// Present in statistics mode
    pub histograms: Option<OutcomeHistograms>,
    /// One entry per configured exponent, in configuration order
    pub filtered: Vec<FilteredAccuracy>,
}

/// Run both comparison directions and check that they agree
pub fn evaluate_kind(
    reference: &VariantSet,
    test: &VariantSet,
    config: &CompareConfig,
) -> KindEvaluation {
    let kind = test.kind();
    let mut histograms = config.enable_stats.then(OutcomeHistograms::new);

    let sink = histograms.as_mut().map(|h| HistogramSink {
        matched: &mut h.tp,
        unmatched: &mut h.fp,
    });
    let forward = compare_sets(test, reference, sink);
    let backward = compare_sets(reference, test, None);

    let accuracy = Accuracy {
        tp: forward.matched,
        fp: forward.unmatched,
        fn_: backward.unmatched,
        cm: backward.matched,
        test_total: test.len() as u64,
        reference_total: reference.len() as u64,
    };

    let issues = check_consistency(&accuracy);
    for issue in &issues {
        log::error!("{}: {}", kind, issue);
    }

    let filtered = match &histograms {
        Some(histograms) => config
            .tp_powers
            .iter()
            .map(|&tp_power| {
                let filtered = apply_filter_search(&accuracy, search_filters(histograms, tp_power));
                for issue in &filtered.issues {
                    log::error!("{} (tp_power={}): {}", kind, tp_power, issue);
                }
                filtered
            })
            .collect(),
        None => Vec::new(),
    };

    KindEvaluation {
        kind,
        accuracy,
        issues,
        histograms,
        filtered,
    }
}

/// Evaluate every variant kind, in substitution, insertion, deletion order
pub fn evaluate_all(
    reference: &VariantSets,
    test: &VariantSets,
    config: &CompareConfig,
) -> Vec<KindEvaluation> {
    VariantKind::ALL
        .iter()
        .map(|&kind| evaluate_kind(reference.get(kind), test.get(kind), config))
        .collect()
}

/// Cross-check the counts of both comparison directions
pub fn check_consistency(accuracy: &Accuracy) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();

    if accuracy.tp != accuracy.cm {
        issues.push(ConsistencyIssue::TpConfirmedMismatch {
            tp: accuracy.tp,
            cm: accuracy.cm,
        });
    }
    if accuracy.tp + accuracy.fp != accuracy.test_total {
        issues.push(ConsistencyIssue::TestTotalMismatch {
            tp: accuracy.tp,
            fp: accuracy.fp,
            total: accuracy.test_total,
        });
    }
    if let Some(issue) = check_reference_total(accuracy) {
        issues.push(issue);
    }

    issues
}

fn check_reference_total(accuracy: &Accuracy) -> Option<ConsistencyIssue> {
    (accuracy.cm + accuracy.fn_ != accuracy.reference_total).then_some(
        ConsistencyIssue::ReferenceTotalMismatch {
            cm: accuracy.cm,
            fn_: accuracy.fn_,
            total: accuracy.reference_total,
        },
    )
}

/// Accuracy of the test set once the filters of `search` are applied.
///
/// Filtered-out true positives become false negatives; the reference side
/// is otherwise unchanged.
fn apply_filter_search(unfiltered: &Accuracy, search: FilterSearch) -> FilteredAccuracy {
    let confirmed = unfiltered.cm + unfiltered.fn_;
    let accuracy = Accuracy {
        tp: search.tp,
        fp: search.fp,
        fn_: confirmed.saturating_sub(search.tp),
        cm: search.tp,
        test_total: search.tp + search.fp,
        reference_total: unfiltered.reference_total,
    };
    let issues = check_reference_total(&accuracy).into_iter().collect();

    FilteredAccuracy {
        search,
        accuracy,
        issues,
    }
}
