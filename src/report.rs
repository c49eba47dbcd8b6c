//! Text rendering of evaluation results

use crate::analysis::{Accuracy, KindEvaluation};
use crate::histogram::{OutcomeHistograms, MARGINAL_ROWS};
use crate::optimizer::FilterSearch;
use crate::variant_set::VariantSets;
use crate::CompareConfig;
use std::io::{self, Write};
use std::path::Path;

const RULE: &str = "--------------------------------------------------------";

/// `value` as a percentage of `total`, undefined for an empty total
pub fn percent(value: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(value as f64 * 100.0 / total as f64)
    }
}

fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}%", value),
        None => "n/a".to_string(),
    }
}

fn fmt_ratio(value: u64, total: u64) -> String {
    fmt_percent(percent(value, total))
}

/// Per-kind record counts of a loaded file
pub fn write_load_summary<W: Write>(w: &mut W, path: &Path, sets: &VariantSets) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "reading {}", path.display())?;
    writeln!(
        w,
        "{} {} {}",
        sets.substitutions.len(),
        sets.insertions.len(),
        sets.deletions.len()
    )
}

/// tp/fp against the test total, fn/cm against the reference total
pub fn write_accuracy<W: Write>(w: &mut W, accuracy: &Accuracy) -> io::Result<()> {
    let rows = [
        ("tp", accuracy.tp, accuracy.test_total),
        ("fp", accuracy.fp, accuracy.test_total),
        ("fn", accuracy.fn_, accuracy.reference_total),
        ("cm", accuracy.cm, accuracy.reference_total),
    ];
    for (label, value, total) in rows {
        writeln!(w, "{}:\t{}\t({}/{})", label, fmt_ratio(value, total), value, total)?;
    }
    Ok(())
}

/// One row per depth: chosen filter, then local precision and recall
pub fn write_filter_table<W: Write>(w: &mut W, search: &FilterSearch) -> io::Result<()> {
    writeln!(w, "{}", RULE)?;
    writeln!(w, "depth\tper\tscore\ttp\t\tcm\ttp_power={:.6}", search.tp_power)?;
    for depth in &search.depths {
        writeln!(
            w,
            "{}\t({},\t{})\t({},\t{})",
            depth.depth,
            depth.candidate.percentage,
            depth.candidate.score,
            fmt_ratio(depth.tp, depth.tp + depth.fp),
            fmt_ratio(depth.tp, depth.tp_total)
        )?;
    }
    writeln!(w, "{}", RULE)
}

/// Distribution of true and false positives along each histogram axis.
///
/// Depth and percentage columns accumulate upward from index 0; the score
/// column shows what remains above each index.
pub fn write_histogram_summary<W: Write>(
    w: &mut W,
    histograms: &OutcomeHistograms,
    accuracy: &Accuracy,
) -> io::Result<()> {
    let tp = histograms.tp.marginals();
    let fp = histograms.fp.marginals();
    let tp_total = histograms.tp.total();
    let fp_total = histograms.fp.total();

    writeln!(
        w,
        "1% tp = {} cm, 1% cm = {} fp",
        fmt_ratio(accuracy.tp, accuracy.cm.saturating_mul(100)),
        fmt_ratio(accuracy.cm, accuracy.fp.saturating_mul(100))
    )?;
    writeln!(
        w,
        "i\t| tp/depth\t\tfp/depth\t| tp/percentage\t\tfp/percentage\t| tp/score\t\tfp/score"
    )?;
    writeln!(
        w,
        "--------+---------------------------------------+---------------------------------------+---------------------------------------"
    )?;

    let mut tp_depth = 0;
    let mut fp_depth = 0;
    let mut tp_percentage = 0;
    let mut fp_percentage = 0;
    let mut tp_score = tp_total;
    let mut fp_score = fp_total;

    for i in 0..MARGINAL_ROWS {
        tp_depth += tp.depth[i];
        fp_depth += fp.depth[i];
        tp_percentage += tp.percentage[i];
        fp_percentage += fp.percentage[i];
        tp_score -= tp.score[i];
        fp_score -= fp.score[i];

        let cell = |acc: u64, value: u64, total: u64| {
            format!("{} ({})", fmt_ratio(acc, total), fmt_ratio(value, total))
        };
        writeln!(
            w,
            "{}\t| {}   \t{}\t| {}   \t{}\t| {}   \t{}",
            i,
            cell(tp_depth, tp.depth[i], tp_total),
            cell(fp_depth, fp.depth[i], fp_total),
            cell(tp_percentage, tp.percentage[i], tp_total),
            cell(fp_percentage, fp.percentage[i], fp_total),
            cell(tp_score, tp.score[i], tp_total),
            cell(fp_score, fp.score[i], fp_total),
        )?;
    }
    Ok(())
}

/// Full report section of one variant kind
pub fn write_kind_evaluation<W: Write>(
    w: &mut W,
    evaluation: &KindEvaluation,
    config: &CompareConfig,
) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", evaluation.kind)?;

    for issue in &evaluation.issues {
        writeln!(w, "{}", issue)?;
    }

    if let (true, Some(histograms)) = (config.print_histogram, &evaluation.histograms) {
        write_histogram_summary(w, histograms, &evaluation.accuracy)?;
    }

    if evaluation.filtered.is_empty() {
        return write_accuracy(w, &evaluation.accuracy);
    }

    for filtered in &evaluation.filtered {
        write_filter_table(w, &filtered.search)?;
        for issue in &filtered.issues {
            writeln!(w, "{}", issue)?;
        }
        write_accuracy(w, &filtered.accuracy)?;
    }
    Ok(())
}
