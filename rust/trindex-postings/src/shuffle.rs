//! Local stand-in for the substrate's sort and group-by-key step.
//!
//! A distributed run sorts the emitted records across machines; this module does the same
//! for records held in memory, so tests and the command-line tool can feed a complete,
//! correctly ordered stream to the merge stage.

use rayon::slice::ParallelSliceMut;

use crate::{
    collation::Collation,
    record::{FieldSlot, Record},
};

/// Below this size a sequential sort beats spawning onto the thread pool.
const PARALLEL_SORT_THRESHOLD: usize = 64 * 1024;

/// Sorts records by key, comparing terms with `collation`.
pub fn sort_records(records: &mut [Record], collation: &dyn Collation) {
    let compare = |a: &Record, b: &Record| a.key.compare_with(&b.key, collation);
    if records.len() < PARALLEL_SORT_THRESHOLD {
        records.sort_unstable_by(compare);
    } else {
        records.par_sort_unstable_by(compare);
    }
}

/// Returns `true` if `records` are in key order under `collation`.
pub fn is_sorted(records: &[Record], collation: &dyn Collation) -> bool {
    records
        .windows(2)
        .all(|w| w[0].key.compare_with(&w[1].key, collation).is_le())
}

/// All records sharing one `(term, slot)` key prefix.
#[derive(Debug, Clone, Copy)]
pub struct RecordGroup<'r> {
    pub records: &'r [Record],
}

impl<'r> RecordGroup<'r> {
    pub fn term(&self) -> &'r str {
        self.records[0].key.term()
    }

    pub fn slot(&self) -> FieldSlot {
        self.records[0].key.slot()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Splits a sorted record slice into `(term, slot)` groups.
pub fn groups(records: &[Record]) -> RecordGroups<'_> {
    RecordGroups { rest: records }
}

/// Iterator over the `(term, slot)` groups of a sorted record slice.
pub struct RecordGroups<'r> {
    rest: &'r [Record],
}

impl<'r> Iterator for RecordGroups<'r> {
    type Item = RecordGroup<'r>;

    fn next(&mut self) -> Option<RecordGroup<'r>> {
        let first = self.rest.first()?;
        let len = self
            .rest
            .iter()
            .position(|r| r.key.slot() != first.key.slot() || r.key.term() != first.key.term())
            .unwrap_or(self.rest.len());
        let (group, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(RecordGroup { records: group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collation::{BinaryCollation, UnicodeCasePreservingCollation},
        record::TermValue,
    };

    fn occurrence(term: &str, field: u32, doc: u64, position: u32) -> Record {
        Record::new(
            term.into(),
            FieldSlot::Field(field),
            TermValue::Occurrence { doc, position },
        )
    }

    #[test]
    fn test_sort_and_group() {
        let mut records = vec![
            occurrence("dog", 0, 1, 1),
            occurrence("cat", 1, 1, 0),
            occurrence("cat", 0, 2, 0),
            Record::new("cat".into(), FieldSlot::Alignment, TermValue::PredicateId { field: 1 }),
            occurrence("cat", 0, 1, 0),
        ];
        sort_records(&mut records, &BinaryCollation);
        assert!(is_sorted(&records, &BinaryCollation));

        let shape: Vec<_> = groups(&records)
            .map(|g| (g.term().to_string(), g.slot(), g.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("cat".into(), FieldSlot::Alignment, 1),
                ("cat".into(), FieldSlot::Field(0), 2),
                ("cat".into(), FieldSlot::Field(1), 1),
                ("dog".into(), FieldSlot::Field(0), 1),
            ]
        );
    }

    #[test]
    fn test_case_variants_stay_separate_groups() {
        let mut records = vec![
            occurrence("cat", 0, 1, 0),
            occurrence("Cat", 0, 1, 1),
            occurrence("cat", 0, 2, 0),
            occurrence("bat", 0, 1, 2),
        ];
        let collation = UnicodeCasePreservingCollation;
        sort_records(&mut records, &collation);
        assert!(!is_sorted(&records, &BinaryCollation));

        let terms: Vec<_> = groups(&records).map(|g| (g.term(), g.len())).collect();
        assert_eq!(terms, vec![("bat", 1), ("Cat", 1), ("cat", 2)]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(groups(&[]).count(), 0);
        assert!(is_sorted(&[], &BinaryCollation));
    }
}
