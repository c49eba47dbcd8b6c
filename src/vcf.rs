//! VCF-like call file reading
//!
//! Only the first five columns (CHROM, POS, ID, REF, ALT) and, when quality
//! extraction is requested, the INFO column are consulted.

use crate::utils::open_text_reader;
use crate::variant_set::VariantSets;
use crate::{CompareError, CompareResult, Quality, VariantRecord};
use csv::StringRecord;
use regex::Regex;
use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

const CHROM: usize = 0;
const POS: usize = 1;
const REF: usize = 3;
const ALT: usize = 4;
const INFO: usize = 7;

/// Normalize a chromosome name to 1-24. Accepts `N`, `chrN`, `X`/`Y` and
/// `chrX`/`chrY`, with X and Y mapped to 23 and 24.
pub fn parse_chromosome(name: &str) -> Option<u8> {
    let name = name.strip_prefix("chr").unwrap_or(name);
    match name {
        "X" => Some(23),
        "Y" => Some(24),
        _ if name.starts_with('0') || !name.bytes().all(|b| b.is_ascii_digit()) => None,
        _ => name.parse::<u8>().ok().filter(|n| (1..=24).contains(n)),
    }
}

fn info_regex() -> &'static Regex {
    static INFO_RE: OnceLock<Regex> = OnceLock::new();
    INFO_RE.get_or_init(|| {
        Regex::new(r"DEPTH=(\d+);COV=(\d+);SCORE=(\d+)").expect("INFO pattern is valid")
    })
}

/// Extract `DEPTH=<int>;COV=<int>;SCORE=<int>` from an INFO field
pub fn extract_quality(info: &str) -> Option<Quality> {
    let caps = info_regex().captures(info)?;
    let depth = caps[1].parse::<u32>().ok()?;
    let coverage = caps[2].parse::<u32>().ok()?;
    let score = caps[3].parse::<u32>().ok()?;
    Some(Quality::from_coverage(depth, coverage, score))
}

/// Calls read from one data line
#[derive(Debug, Clone, Default)]
pub struct ParsedLine {
    pub records: Vec<VariantRecord>,
    /// Alleles whose lengths matched no variant kind
    pub unclassified: usize,
}

/// Parse one tokenized data line. Returns `Ok(None)` when the chromosome
/// is not one of the recognized names.
pub fn parse_fields(
    fields: &StringRecord,
    line: u64,
    extract: bool,
) -> CompareResult<Option<ParsedLine>> {
    if fields.len() <= ALT {
        return Err(CompareError::InvalidVariant(format!(
            "Invalid VCF line {} - not enough columns: {:?}",
            line,
            fields.iter().collect::<Vec<_>>().join("\t")
        )));
    }

    let position = fields[POS].parse::<u64>().map_err(|_| {
        CompareError::InvalidVariant(format!("Invalid position on line {}: {}", line, &fields[POS]))
    })?;

    let quality = if extract {
        let info = fields.get(INFO).unwrap_or("");
        Some(extract_quality(info).ok_or_else(|| CompareError::MalformedInfo {
            line,
            info: info.to_string(),
        })?)
    } else {
        None
    };

    let chromosome = match parse_chromosome(&fields[CHROM]) {
        Some(chromosome) => chromosome,
        None => return Ok(None),
    };

    // Multi-allelic sites contribute one call per alternate allele
    let mut parsed = ParsedLine::default();
    for alt_allele in fields[ALT].split(',') {
        match VariantRecord::new(
            chromosome,
            position,
            fields[REF].to_string(),
            alt_allele.to_string(),
            quality,
        ) {
            Some(record) => parsed.records.push(record),
            None => parsed.unclassified += 1,
        }
    }

    Ok(Some(parsed))
}

/// Tab-separated call file reader that skips `#` header lines
pub struct VcfReader {
    reader: csv::Reader<Box<dyn BufRead>>,
    fields: StringRecord,
    extract: bool,
}

impl VcfReader {
    pub fn new<P: AsRef<Path>>(path: P, extract: bool) -> CompareResult<Self> {
        Ok(Self::from_reader(open_text_reader(path)?, extract))
    }

    pub fn from_reader(reader: Box<dyn BufRead>, extract: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        VcfReader {
            reader,
            fields: StringRecord::new(),
            extract,
        }
    }

    /// Decompressed bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.reader.position().byte()
    }

    /// Read the next data line. `Ok(None)` at end of input; the inner
    /// `None` marks a line on an unrecognized chromosome.
    pub fn read_line(&mut self) -> CompareResult<Option<(u64, Option<ParsedLine>)>> {
        if !self.reader.read_record(&mut self.fields)? {
            return Ok(None);
        }
        let line = self.fields.position().map(|p| p.line()).unwrap_or(0);
        let parsed = parse_fields(&self.fields, line, self.extract)?;
        Ok(Some((line, parsed)))
    }

    /// Chromosome column of the last line read
    pub fn last_chromosome(&self) -> &str {
        self.fields.get(CHROM).unwrap_or("")
    }
}

/// Load a call file into per-kind sets.
///
/// `extract` enables INFO quality extraction; a line without a well-formed
/// quality then aborts the load. `on_progress` receives the number of bytes
/// consumed after each line.
pub fn load_variant_sets<P, F>(path: P, extract: bool, on_progress: F) -> CompareResult<VariantSets>
where
    P: AsRef<Path>,
    F: FnMut(u64),
{
    let reader = VcfReader::new(&path, extract)?;
    let sets = read_variant_sets(reader, on_progress)?;

    log::info!(
        "{}: {} substitutions, {} insertions, {} deletions",
        path.as_ref().display(),
        sets.substitutions.len(),
        sets.insertions.len(),
        sets.deletions.len()
    );
    if sets.skipped > 0 {
        log::warn!(
            "{}: skipped {} records on unrecognized chromosomes",
            path.as_ref().display(),
            sets.skipped
        );
    }
    if sets.unclassified > 0 {
        log::info!(
            "{}: ignored {} alleles matching no variant kind",
            path.as_ref().display(),
            sets.unclassified
        );
    }

    Ok(sets)
}

/// Drain a reader into per-kind sets
pub fn read_variant_sets<F: FnMut(u64)>(
    mut reader: VcfReader,
    mut on_progress: F,
) -> CompareResult<VariantSets> {
    let mut sets = VariantSets::new();

    while let Some((line, parsed)) = reader.read_line()? {
        match parsed {
            Some(parsed) => {
                sets.unclassified += parsed.unclassified;
                for record in parsed.records {
                    sets.insert(record);
                }
            }
            None => {
                log::debug!(
                    "Skipping line {} on unrecognized chromosome {:?}",
                    line,
                    reader.last_chromosome()
                );
                sets.skipped += 1;
            }
        }
        on_progress(reader.bytes_read());
    }

    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariantKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fields(line: &str) -> StringRecord {
        StringRecord::from(line.split('\t').collect::<Vec<_>>())
    }

    #[test]
    fn test_parse_chromosome_aliases() {
        assert_eq!(parse_chromosome("1"), Some(1));
        assert_eq!(parse_chromosome("chr1"), Some(1));
        assert_eq!(parse_chromosome("22"), Some(22));
        assert_eq!(parse_chromosome("X"), Some(23));
        assert_eq!(parse_chromosome("chr23"), Some(23));
        assert_eq!(parse_chromosome("23"), Some(23));
        assert_eq!(parse_chromosome("chrX"), Some(23));
        assert_eq!(parse_chromosome("Y"), Some(24));
        assert_eq!(parse_chromosome("chr24"), Some(24));

        assert_eq!(parse_chromosome("0"), None);
        assert_eq!(parse_chromosome("25"), None);
        assert_eq!(parse_chromosome("chrM"), None);
        assert_eq!(parse_chromosome("+1"), None);
        assert_eq!(parse_chromosome("01"), None);
        assert_eq!(parse_chromosome("chr01"), None);
        assert_eq!(parse_chromosome("chr001"), None);
        assert_eq!(parse_chromosome(""), None);
    }

    #[test]
    fn test_extract_quality() {
        let quality = extract_quality("DEPTH=5;COV=10;SCORE=30").unwrap();
        assert_eq!(quality, Quality::new(5, 50, 30));

        let quality = extract_quality("DEPTH=3;COV=0;SCORE=1").unwrap();
        assert_eq!(quality.percentage, 100);

        assert!(extract_quality("DP=30").is_none());
        assert!(extract_quality("DEPTH=a;COV=10;SCORE=30").is_none());
        assert!(extract_quality("").is_none());
    }

    #[test]
    fn test_parse_fields() {
        let parsed = parse_fields(&fields("chr1\t100\t.\tA\tT\t.\tPASS\tDEPTH=10;COV=10;SCORE=5"), 1, true)
            .unwrap()
            .unwrap();

        assert_eq!(parsed.records.len(), 1);
        let record = &parsed.records[0];
        assert_eq!(record.chromosome, 1);
        assert_eq!(record.position, 100);
        assert_eq!(record.kind, VariantKind::Substitution);
        assert_eq!(record.quality, Some(Quality::new(10, 100, 5)));
    }

    #[test]
    fn test_parse_fields_without_extraction_ignores_info() {
        let parsed = parse_fields(&fields("2\t100\t.\tAT\tA\t.\tPASS\tDP=3"), 1, false)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.records[0].kind, VariantKind::Deletion);
        assert_eq!(parsed.records[0].quality, None);
    }

    #[test]
    fn test_parse_fields_multi_allelic() {
        let parsed = parse_fields(&fields("1\t100\t.\tA\tT,AG,C\t.\tPASS\t."), 1, false)
            .unwrap()
            .unwrap();
        let kinds: Vec<_> = parsed.records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![VariantKind::Substitution, VariantKind::Insertion, VariantKind::Substitution]
        );
    }

    #[test]
    fn test_parse_fields_errors() {
        assert!(matches!(
            parse_fields(&fields("1\t100\t.\tA"), 3, false),
            Err(CompareError::InvalidVariant(_))
        ));
        assert!(matches!(
            parse_fields(&fields("1\tabc\t.\tA\tT\t.\tPASS\t."), 3, false),
            Err(CompareError::InvalidVariant(_))
        ));
        assert!(matches!(
            parse_fields(&fields("1\t100\t.\tA\tT\t.\tPASS\tDP=30"), 3, true),
            Err(CompareError::MalformedInfo { line: 3, .. })
        ));
        assert!(matches!(
            parse_fields(&fields("1\t100\t.\tA\tT"), 3, true),
            Err(CompareError::MalformedInfo { .. })
        ));
    }

    #[test]
    fn test_parse_fields_unknown_chromosome() {
        assert!(parse_fields(&fields("chrM\t100\t.\tA\tT"), 1, false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_variant_sets() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "##fileformat=VCFv4.2").unwrap();
        writeln!(temp_file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
        writeln!(temp_file, "chr1\t100\t.\tA\tT\t.\tPASS\tDEPTH=10;COV=10;SCORE=5").unwrap();
        writeln!(temp_file, "chr1\t150\t.\tA\tAC\t.\tPASS\tDEPTH=5;COV=10;SCORE=30").unwrap();
        writeln!(temp_file, "X\t200\t.\tACG\tA\t.\tPASS\tDEPTH=1;COV=4;SCORE=12").unwrap();
        writeln!(temp_file, "chrM\t10\t.\tA\tG\t.\tPASS\tDEPTH=1;COV=4;SCORE=12").unwrap();
        writeln!(temp_file, "1\t300\t.\tAC\tGT\t.\tPASS\tDEPTH=1;COV=4;SCORE=12").unwrap();
        writeln!(temp_file).unwrap();

        let mut progress = Vec::new();
        let sets = load_variant_sets(temp_file.path(), true, |bytes| progress.push(bytes)).unwrap();

        assert_eq!(sets.substitutions.len(), 1);
        assert_eq!(sets.insertions.len(), 1);
        assert_eq!(sets.deletions.len(), 1);
        assert_eq!(sets.skipped, 1);
        assert_eq!(sets.unclassified, 1);

        let deletion = sets.deletions.calls_at(&(23, 200)).unwrap();
        assert_eq!(
            deletion.get(&("ACG".to_string(), "A".to_string())),
            Some(&Some(Quality::new(1, 25, 12)))
        );

        assert_eq!(progress.len(), 5);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_load_variant_sets_malformed_info_aborts() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "chr1\t100\t.\tA\tT\t.\tPASS\tDEPTH=10;COV=10;SCORE=5").unwrap();
        writeln!(temp_file, "chr1\t200\t.\tA\tT\t.\tPASS\tDP=10").unwrap();

        let result = load_variant_sets(temp_file.path(), true, |_| {});
        assert!(matches!(result, Err(CompareError::MalformedInfo { line: 2, .. })));

        let sets = load_variant_sets(temp_file.path(), false, |_| {}).unwrap();
        assert_eq!(sets.substitutions.len(), 2);
    }

    #[test]
    fn test_load_variant_sets_missing_file() {
        let result = load_variant_sets("/nonexistent/calls.vcf", false, |_| {});
        assert!(matches!(result, Err(CompareError::FileNotFound(_))));
    }
}
