//! # vcfqual - Variant call set quality assessment
//!
//! Compares the variant calls produced by a calling pipeline against a trusted
//! reference call set, and optionally searches for the confidence filter that
//! best trades precision against recall for each read-depth bucket.

pub mod analysis;
pub mod compare;
pub mod histogram;
pub mod optimizer;
pub mod report;
pub mod utils;
pub mod variant_set;
pub mod vcf;

use std::fmt;

/// Exponent applied to precision when none is configured
pub const DEFAULT_TP_POWER: f64 = 2.0;

/// Exponents evaluated in statistics mode unless the caller picks its own
pub const STANDARD_TP_POWERS: [f64; 15] = [
    0.5, 0.8, 1.0, 1.2, 1.5, 1.8, DEFAULT_TP_POWER, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0, 7.0, 8.0,
];

/// Kind of a small variant, derived from its allele lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Substitution,
    Insertion,
    Deletion,
}

impl VariantKind {
    pub const ALL: [VariantKind; 3] = [
        VariantKind::Substitution,
        VariantKind::Insertion,
        VariantKind::Deletion,
    ];

    /// Classify a REF/ALT pair. Pairs that are neither a single-base
    /// substitution nor a pure insertion or deletion have no kind.
    pub fn classify(ref_allele: &str, alt_allele: &str) -> Option<Self> {
        let ref_len = ref_allele.len();
        let alt_len = alt_allele.len();

        if ref_len == 1 && alt_len == 1 {
            Some(VariantKind::Substitution)
        } else if ref_len > 1 && alt_len <= 1 {
            Some(VariantKind::Deletion)
        } else if alt_len > 1 && ref_len <= 1 {
            Some(VariantKind::Insertion)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VariantKind::Substitution => "substitution",
            VariantKind::Insertion => "insertion",
            VariantKind::Deletion => "deletion",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quality metadata attached to a test call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quality {
    pub depth: u32,
    /// Allele fraction as a whole percentage of the coverage
    pub percentage: u32,
    pub score: u32,
}

impl Quality {
    pub fn new(depth: u32, percentage: u32, score: u32) -> Self {
        Self {
            depth,
            percentage,
            score,
        }
    }

    /// Build from raw depth and coverage; zero coverage counts as 100%.
    pub fn from_coverage(depth: u32, coverage: u32, score: u32) -> Self {
        let percentage = if coverage == 0 {
            100
        } else {
            u32::try_from(u64::from(depth) * 100 / u64::from(coverage)).unwrap_or(u32::MAX)
        };
        Self::new(depth, percentage, score)
    }
}

/// A single positioned call read from a VCF-like file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantRecord {
    /// Normalized chromosome number, 1-22 plus 23 (X) and 24 (Y)
    pub chromosome: u8,
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub kind: VariantKind,
    pub quality: Option<Quality>,
}

impl VariantRecord {
    /// Returns `None` when the alleles do not describe a recognized kind.
    pub fn new(
        chromosome: u8,
        position: u64,
        ref_allele: String,
        alt_allele: String,
        quality: Option<Quality>,
    ) -> Option<Self> {
        let kind = VariantKind::classify(&ref_allele, &alt_allele)?;
        Some(Self {
            chromosome,
            position,
            ref_allele,
            alt_allele,
            kind,
            quality,
        })
    }
}

/// Run configuration, built once by the caller and passed down explicitly
#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// Collect quality histograms and search for the best filter
    pub enable_stats: bool,
    /// Precision exponents evaluated by the filter search
    pub tp_powers: Vec<f64>,
    /// Print the per-axis histogram summary in statistics mode
    pub print_histogram: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            enable_stats: false,
            tp_powers: STANDARD_TP_POWERS.to_vec(),
            print_histogram: false,
        }
    }
}

/// Validate the run configuration
pub fn validate_compare_config(config: &CompareConfig) -> CompareResult<()> {
    if config.tp_powers.is_empty() {
        return Err(CompareError::InvalidConfig(
            "at least one tp power is required".to_string(),
        ));
    }

    if let Some(bad) = config
        .tp_powers
        .iter()
        .find(|p| !p.is_finite() || **p <= 0.0)
    {
        return Err(CompareError::InvalidConfig(format!(
            "tp power must be a positive finite number, got {}",
            bad
        )));
    }

    Ok(())
}

/// Error types for the vcfqual library
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid variant format: {0}")]
    InvalidVariant(String),

    #[error("Malformed INFO field on line {line}: {info:?} (expected DEPTH=<int>;COV=<int>;SCORE=<int>)")]
    MalformedInfo { line: u64, info: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type CompareResult<T> = Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(VariantKind::classify("A", "T"), Some(VariantKind::Substitution));
        assert_eq!(VariantKind::classify("AT", "A"), Some(VariantKind::Deletion));
        assert_eq!(VariantKind::classify("AT", ""), Some(VariantKind::Deletion));
        assert_eq!(VariantKind::classify("A", "AT"), Some(VariantKind::Insertion));
        assert_eq!(VariantKind::classify("AT", "GC"), None);
        assert_eq!(VariantKind::classify("", ""), None);
    }

    #[test]
    fn test_quality_from_coverage() {
        assert_eq!(Quality::from_coverage(10, 10, 5).percentage, 100);
        assert_eq!(Quality::from_coverage(5, 10, 30).percentage, 50);
        assert_eq!(Quality::from_coverage(1, 3, 0).percentage, 33);
        assert_eq!(Quality::from_coverage(7, 0, 0).percentage, 100);
    }

    #[test]
    fn test_quality_from_coverage_saturates() {
        let quality = Quality::from_coverage(42_949_673, 1, 5);
        assert_eq!(quality.percentage, u32::MAX);

        let quality = Quality::from_coverage(u32::MAX, 1, 5);
        assert_eq!(quality.percentage, u32::MAX);
    }

    #[test]
    fn test_variant_record_drops_unknown_kind() {
        assert!(VariantRecord::new(1, 100, "AC".into(), "GT".into(), None).is_none());
        let record = VariantRecord::new(1, 100, "A".into(), "ACG".into(), None).unwrap();
        assert_eq!(record.kind, VariantKind::Insertion);
    }

    #[test]
    fn test_validate_compare_config() {
        assert!(validate_compare_config(&CompareConfig::default()).is_ok());

        let config = CompareConfig {
            tp_powers: vec![],
            ..CompareConfig::default()
        };
        assert!(validate_compare_config(&config).is_err());

        let config = CompareConfig {
            tp_powers: vec![2.0, -1.0],
            ..CompareConfig::default()
        };
        assert!(validate_compare_config(&config).is_err());

        let config = CompareConfig {
            tp_powers: vec![f64::NAN],
            ..CompareConfig::default()
        };
        assert!(validate_compare_config(&config).is_err());
    }
}
