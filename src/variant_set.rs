//! In-memory index of the calls of one variant kind

use crate::{Quality, VariantKind, VariantRecord};
use std::collections::HashMap;

/// `(chromosome, position)`
pub type Locus = (u8, u64);

/// `(reference allele, alternate allele)`
pub type AllelePair = (String, String);

/// Calls at one locus, keyed by allele pair. Quality is `None` when the file
/// was loaded without quality extraction.
pub type LocusCalls = HashMap<AllelePair, Option<Quality>>;

/// Calls of a single kind, grouped by locus then by allele pair.
///
/// `records` counts every record inserted, so a file listing the same call
/// twice yields one entry but two records. The comparison consistency checks
/// rely on that difference to flag malformed input.
#[derive(Debug, Clone)]
pub struct VariantSet {
    kind: VariantKind,
    loci: HashMap<Locus, LocusCalls>,
    records: usize,
}

impl VariantSet {
    pub fn new(kind: VariantKind) -> Self {
        Self {
            kind,
            loci: HashMap::new(),
            records: 0,
        }
    }

    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    /// Insert a record. Records of another kind are refused and `false` is
    /// returned.
    pub fn insert(&mut self, record: VariantRecord) -> bool {
        if record.kind != self.kind {
            return false;
        }

        self.loci
            .entry((record.chromosome, record.position))
            .or_default()
            .insert((record.ref_allele, record.alt_allele), record.quality);
        self.records += 1;
        true
    }

    /// Number of records inserted, duplicates included
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Number of distinct `(locus, allele pair)` entries
    pub fn distinct_len(&self) -> usize {
        self.loci.values().map(|calls| calls.len()).sum()
    }

    pub fn calls_at(&self, locus: &Locus) -> Option<&LocusCalls> {
        self.loci.get(locus)
    }

    pub fn loci(&self) -> impl Iterator<Item = (&Locus, &LocusCalls)> {
        self.loci.iter()
    }
}

/// The three per-kind sets loaded from one file
#[derive(Debug, Clone)]
pub struct VariantSets {
    pub substitutions: VariantSet,
    pub insertions: VariantSet,
    pub deletions: VariantSet,
    /// Records whose chromosome could not be normalized
    pub skipped: usize,
    /// Records whose alleles matched no kind
    pub unclassified: usize,
}

impl VariantSets {
    pub fn new() -> Self {
        Self {
            substitutions: VariantSet::new(VariantKind::Substitution),
            insertions: VariantSet::new(VariantKind::Insertion),
            deletions: VariantSet::new(VariantKind::Deletion),
            skipped: 0,
            unclassified: 0,
        }
    }

    pub fn get(&self, kind: VariantKind) -> &VariantSet {
        match kind {
            VariantKind::Substitution => &self.substitutions,
            VariantKind::Insertion => &self.insertions,
            VariantKind::Deletion => &self.deletions,
        }
    }

    /// Route a record to the set of its kind
    pub fn insert(&mut self, record: VariantRecord) {
        let set = match record.kind {
            VariantKind::Substitution => &mut self.substitutions,
            VariantKind::Insertion => &mut self.insertions,
            VariantKind::Deletion => &mut self.deletions,
        };
        set.insert(record);
    }
}

impl Default for VariantSets {
    fn default() -> Self {
        Self::new()
    }
}
