//! CLI binary comparing a pipeline call set with a reference call set

use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use vcfqual_rs::{
    analysis::evaluate_all,
    report::{write_kind_evaluation, write_load_summary},
    utils::{format_file_size, is_gzipped, validate_file_readable, Timer},
    validate_compare_config,
    variant_set::VariantSets,
    vcf::load_variant_sets,
    CompareConfig, CompareError, CompareResult, STANDARD_TP_POWERS,
};

#[derive(Parser)]
#[command(name = "compare_vcf")]
#[command(about = "Compute the quality of a VCF compared to a reference VCF")]
#[command(long_about = "
Compares the calls of a variant calling pipeline against a trusted reference
call set. Substitutions, insertions and deletions are evaluated separately and
reported as true positives (tp), false positives (fp), false negatives (fn)
and confirmed reference calls (cm).

With --enable-stat, the INFO field of every test call must carry
DEPTH=<int>;COV=<int>;SCORE=<int>. The tool then searches, for each depth up
to 20, the filter (percentage >= P, score <= S) that maximizes
precision^tp_power * recall, and reports the accuracy left after filtering
for each tp power.

Both files may be plain text or gzip compressed.
")]
struct Args {
    /// The reference VCF
    #[arg(value_name = "REFERENCE_VCF")]
    reference: PathBuf,

    /// The VCF produced by the pipeline under evaluation
    #[arg(value_name = "TEST_VCF")]
    test: PathBuf,

    /// Power applied to precision during the filter search; repeat to
    /// evaluate several (default: 0.5 to 8)
    #[arg(short = 't', long = "tp-power", value_name = "POWER")]
    tp_power: Vec<f64>,

    /// Enable the automatic filter search
    #[arg(short = 'a', long = "enable-stat")]
    enable_stat: bool,

    /// Print the tp/fp distribution along depth, percentage and score
    #[arg(long)]
    histogram: bool,

    /// Show a progress bar while reading input files
    #[arg(short, long)]
    progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn build_config(args: &Args) -> CompareConfig {
    CompareConfig {
        enable_stats: args.enable_stat,
        tp_powers: if args.tp_power.is_empty() {
            STANDARD_TP_POWERS.to_vec()
        } else {
            args.tp_power.clone()
        },
        print_histogram: args.histogram,
    }
}

fn progress_bar(path: &Path) -> CompareResult<ProgressBar> {
    let pb = if is_gzipped(path)? {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
                .expect("Failed to set progress bar template"),
        );
        pb
    } else {
        let pb = ProgressBar::new(std::fs::metadata(path)?.len());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
                .expect("Failed to set progress bar template")
                .progress_chars("#>-"),
        );
        pb
    };
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_message(path.display().to_string());
    Ok(pb)
}

fn load(path: &Path, extract: bool, show_progress: bool) -> CompareResult<VariantSets> {
    let _timer = Timer::new(&format!("Reading {}", path.display()));
    log::info!(
        "Reading {} ({})",
        path.display(),
        format_file_size(std::fs::metadata(path)?.len())
    );

    if !show_progress {
        return load_variant_sets(path, extract, |_| {});
    }

    let pb = progress_bar(path)?;
    let sets = load_variant_sets(path, extract, |bytes| pb.set_position(bytes));
    pb.finish_and_clear();
    sets
}

fn run() -> CompareResult<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    let config = build_config(&args);
    validate_compare_config(&config)?;

    if config.print_histogram && !config.enable_stats {
        log::warn!("--histogram has no effect without --enable-stat");
    }

    log::info!("Reference VCF: {:?}", args.reference);
    log::info!("Test VCF: {:?}", args.test);
    log::info!(
        "Statistics: {}, tp powers: {:?}",
        config.enable_stats,
        config.tp_powers
    );

    validate_file_readable(&args.reference)?;
    validate_file_readable(&args.test)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Quality is only extracted from the test file
    let reference = load(&args.reference, false, args.progress)?;
    write_load_summary(&mut out, &args.reference, &reference)?;
    let test = load(&args.test, config.enable_stats, args.progress)?;
    write_load_summary(&mut out, &args.test, &test)?;

    let _timer = Timer::new("Comparing call sets");
    for evaluation in evaluate_all(&reference, &test, &config) {
        write_kind_evaluation(&mut out, &evaluation, &config)?;
    }
    out.flush()?;

    Ok(())
}

/// Handle application errors and provide user-friendly messages
fn handle_error(error: CompareError) -> ! {
    match error {
        CompareError::FileNotFound(path) => {
            eprintln!("Error: File not found: {}", path);
            eprintln!("Please check that the file exists and is readable.");
        }
        CompareError::InvalidVariant(msg) => {
            eprintln!("Error: Invalid variant data: {}", msg);
            eprintln!("Please check that your VCF file is properly formatted.");
        }
        CompareError::MalformedInfo { line, info } => {
            eprintln!("Error: Malformed INFO field on line {}: {:?}", line, info);
            eprintln!("--enable-stat requires DEPTH=<int>;COV=<int>;SCORE=<int> in every test call.");
        }
        CompareError::InvalidConfig(msg) => {
            eprintln!("Error: Invalid configuration: {}", msg);
            eprintln!("Please check your tp power values.");
        }
        CompareError::Csv(ref e) => {
            eprintln!("Error: Could not tokenize VCF line: {}", e);
            eprintln!("Please check that your VCF file is tab separated.");
        }
        CompareError::Io(ref e) => {
            eprintln!("Error: I/O error: {}", e);
            eprintln!("Please check file permissions.");
        }
    }
    std::process::exit(1);
}

fn main() {
    if let Err(e) = run() {
        handle_error(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use vcfqual_rs::report::write_accuracy;
    use vcfqual_rs::VariantKind;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["compare_vcf", "ref.vcf", "test.vcf"]).unwrap();
        let config = build_config(&args);

        assert!(!config.enable_stats);
        assert!(!config.print_histogram);
        assert_eq!(config.tp_powers, STANDARD_TP_POWERS.to_vec());
        assert!(validate_compare_config(&config).is_ok());
    }

    #[test]
    fn test_args_custom_tp_powers() {
        let args = Args::try_parse_from([
            "compare_vcf", "-a", "-t", "1.5", "-t", "3", "ref.vcf", "test.vcf",
        ])
        .unwrap();
        let config = build_config(&args);

        assert!(config.enable_stats);
        assert_eq!(config.tp_powers, vec![1.5, 3.0]);
    }

    #[test]
    fn test_args_require_both_files() {
        assert!(Args::try_parse_from(["compare_vcf", "ref.vcf"]).is_err());
    }

    #[test]
    fn test_end_to_end_without_stats() {
        let mut reference_file = NamedTempFile::new().unwrap();
        writeln!(reference_file, "##fileformat=VCFv4.2").unwrap();
        writeln!(reference_file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
        writeln!(reference_file, "chr1\t100\t.\tA\tT\t.\tPASS\t.").unwrap();
        writeln!(reference_file, "chr1\t200\t.\tG\tC\t.\tPASS\t.").unwrap();

        let mut test_file = NamedTempFile::new().unwrap();
        writeln!(test_file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
        writeln!(test_file, "1\t100\t.\tA\tT\t.\tPASS\tDEPTH=10;COV=10;SCORE=5").unwrap();
        writeln!(test_file, "1\t150\t.\tA\tC\t.\tPASS\tDEPTH=5;COV=10;SCORE=30").unwrap();

        let config = CompareConfig::default();
        let reference = load(reference_file.path(), false, false).unwrap();
        let test = load(test_file.path(), config.enable_stats, false).unwrap();
        let evaluations = evaluate_all(&reference, &test, &config);

        let substitutions = &evaluations[0];
        assert_eq!(substitutions.kind, VariantKind::Substitution);
        assert!(substitutions.issues.is_empty());

        let mut out = Vec::new();
        write_accuracy(&mut out, &substitutions.accuracy).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "tp:\t50.00%\t(1/2)\nfp:\t50.00%\t(1/2)\nfn:\t50.00%\t(1/2)\ncm:\t50.00%\t(1/2)\n"
        );
    }

    #[test]
    fn test_end_to_end_chromosome_aliases() {
        let mut reference_file = NamedTempFile::new().unwrap();
        writeln!(reference_file, "X\t100\t.\tA\tT\t.\tPASS\t.").unwrap();
        writeln!(reference_file, "chr24\t300\t.\tAG\tA\t.\tPASS\t.").unwrap();

        let mut test_file = NamedTempFile::new().unwrap();
        writeln!(test_file, "chr23\t100\t.\tA\tT\t.\tPASS\tDEPTH=9;COV=10;SCORE=11").unwrap();
        writeln!(test_file, "Y\t300\t.\tAG\tA\t.\tPASS\tDEPTH=9;COV=10;SCORE=11").unwrap();

        let config = CompareConfig {
            enable_stats: true,
            tp_powers: vec![2.0],
            ..CompareConfig::default()
        };
        let reference = load(reference_file.path(), false, false).unwrap();
        let test = load(test_file.path(), config.enable_stats, false).unwrap();
        let evaluations = evaluate_all(&reference, &test, &config);

        for evaluation in &evaluations {
            assert_eq!(evaluation.accuracy.fp, 0);
            assert_eq!(evaluation.accuracy.fn_, 0);
            assert!(evaluation.issues.is_empty());
        }
        assert_eq!(evaluations[0].accuracy.tp, 1);
        assert_eq!(evaluations[2].accuracy.tp, 1);

        let substitutions = &evaluations[0].filtered[0];
        assert_eq!(substitutions.search.depths[9].candidate.percentage, 90);
        assert_eq!(substitutions.accuracy.tp, 1);
    }

    #[test]
    fn test_end_to_end_malformed_info() {
        let mut test_file = NamedTempFile::new().unwrap();
        writeln!(test_file, "chr1\t100\t.\tA\tT\t.\tPASS\tDP=30").unwrap();

        assert!(matches!(
            load(test_file.path(), true, false),
            Err(CompareError::MalformedInfo { line: 1, .. })
        ));
        assert!(load(test_file.path(), false, false).is_ok());
    }
}
