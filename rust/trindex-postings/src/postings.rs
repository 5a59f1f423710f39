//! Reference merge stage: rebuilds postings from a sorted record stream in one pass.
//!
//! The assembler walks every `(term, slot)` group once, front to back, and reports the
//! result through a [`PostingSink`] using the same start/push/end protocol as a term
//! posting writer:
//!
//! 1. `start_term` once per group;
//! 2. `push_posting` once per document (field groups) or `push_alignment` once per distinct
//!    field (alignment groups);
//! 3. `end_term` once the group is exhausted.
//!
//! Because of the key ordering contract (see [`crate::record`]), a document's posting can
//! be completed as soon as its `LastOccurrence` record arrives: the count comes first, the
//! positions follow in ascending order. Any record that breaks that shape is reported as an
//! `InvalidFormat` error instead of being silently repaired.

use serde::Serialize;
use trindex_common::{Result, error::Error, verify_data};

use crate::{
    record::{FieldSlot, Record, TermValue},
    shuffle::{RecordGroup, groups},
};

/// Occurrences of a term in one field of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocPosting {
    pub doc: u64,
    pub count: u32,
    pub positions: Vec<u32>,
    pub last: u32,
}

/// Consumer of assembled postings.
pub trait PostingSink {
    /// Begins a new `(term, slot)` group.
    fn start_term(&mut self, term: &str, slot: FieldSlot) -> Result<()>;

    /// Adds the posting of one document to the current field group. Documents arrive in
    /// ascending id order.
    fn push_posting(&mut self, posting: &DocPosting) -> Result<()>;

    /// Adds one field to the current alignment group. Fields arrive in ascending order,
    /// without duplicates.
    fn push_alignment(&mut self, field: u32) -> Result<()>;

    /// Finishes the current group.
    fn end_term(&mut self) -> Result<()>;
}

/// Totals of one assembly run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub groups: usize,
    pub postings: usize,
    pub alignments: usize,
}

/// Assembles every group of a sorted record slice into `sink`.
pub fn assemble<S: PostingSink + ?Sized>(records: &[Record], sink: &mut S) -> Result<AssemblyStats> {
    let mut stats = AssemblyStats::default();
    for group in groups(records) {
        sink.start_term(group.term(), group.slot())?;
        match group.slot() {
            FieldSlot::Alignment => stats.alignments += assemble_alignment(&group, sink)?,
            FieldSlot::Field(_) => stats.postings += assemble_field(&group, sink)?,
        }
        sink.end_term()?;
        stats.groups += 1;
    }
    Ok(stats)
}

fn assemble_alignment<S: PostingSink + ?Sized>(group: &RecordGroup, sink: &mut S) -> Result<usize> {
    let mut previous = None;
    let mut pushed = 0;
    for record in group.records {
        let TermValue::PredicateId { field } = record.value else {
            return Err(unexpected(group, &record.value));
        };
        match previous {
            Some(prev) if prev == field => continue,
            Some(prev) => verify_data!(alignment_order, prev < field),
            None => (),
        }
        sink.push_alignment(field)?;
        previous = Some(field);
        pushed += 1;
    }
    Ok(pushed)
}

fn assemble_field<S: PostingSink + ?Sized>(group: &RecordGroup, sink: &mut S) -> Result<usize> {
    let mut open: Option<DocPosting> = None;
    let mut previous_doc: Option<u64> = None;
    let mut pushed = 0;

    for record in group.records {
        let Some(posting) = open.as_mut() else {
            let TermValue::OccurrenceCount { doc, count } = record.value else {
                return Err(unexpected(group, &record.value));
            };
            if let Some(prev) = previous_doc {
                verify_data!(document_order, prev < doc);
            }
            verify_data!(occurrence_count, count > 0);
            open = Some(DocPosting {
                doc,
                count,
                positions: Vec::with_capacity(count as usize),
                last: 0,
            });
            continue;
        };

        match record.value {
            TermValue::Occurrence { doc, position } if posting.doc == doc => {
                if let Some(&prev) = posting.positions.last() {
                    verify_data!(position_order, prev < position);
                }
                posting.positions.push(position);
            }
            TermValue::LastOccurrence { doc, position } if posting.doc == doc => {
                verify_data!(
                    occurrence_count,
                    posting.positions.len() == posting.count as usize
                );
                verify_data!(last_occurrence, posting.positions.last() == Some(&position));
                posting.last = position;
                sink.push_posting(posting)?;
                previous_doc = Some(doc);
                pushed += 1;
                open = None;
            }
            value => return Err(unexpected(group, &value)),
        }
    }

    if let Some(posting) = open {
        return Err(Error::invalid_format(
            group.term(),
            format!("posting of document {} is not terminated", posting.doc),
        ));
    }
    Ok(pushed)
}

#[cold]
fn unexpected(group: &RecordGroup, value: &TermValue) -> Error {
    Error::invalid_format(
        group.term(),
        format!("unexpected {value:?} in group {:?}", group.slot()),
    )
}

/// Postings of one `(term, slot)` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermPostings {
    Field {
        term: String,
        field: u32,
        postings: Vec<DocPosting>,
    },
    Alignment {
        term: String,
        fields: Vec<u32>,
    },
}

impl TermPostings {
    pub fn term(&self) -> &str {
        match self {
            TermPostings::Field { term, .. } | TermPostings::Alignment { term, .. } => term,
        }
    }
}

/// Sink collecting every group in memory.
#[derive(Debug, Default)]
pub struct CollectedPostings {
    pub terms: Vec<TermPostings>,
}

impl CollectedPostings {
    fn current(&mut self) -> Result<&mut TermPostings> {
        self.terms
            .last_mut()
            .ok_or_else(|| Error::invalid_operation("posting pushed before start_term"))
    }
}

impl PostingSink for CollectedPostings {
    fn start_term(&mut self, term: &str, slot: FieldSlot) -> Result<()> {
        let term = term.to_string();
        self.terms.push(match slot {
            FieldSlot::Alignment => TermPostings::Alignment {
                term,
                fields: Vec::new(),
            },
            FieldSlot::Field(field) => TermPostings::Field {
                term,
                field,
                postings: Vec::new(),
            },
        });
        Ok(())
    }

    fn push_posting(&mut self, posting: &DocPosting) -> Result<()> {
        match self.current()? {
            TermPostings::Field { postings, .. } => {
                postings.push(posting.clone());
                Ok(())
            }
            TermPostings::Alignment { .. } => {
                Err(Error::invalid_operation("posting pushed to alignment group"))
            }
        }
    }

    fn push_alignment(&mut self, field: u32) -> Result<()> {
        match self.current()? {
            TermPostings::Alignment { fields, .. } => {
                fields.push(field);
                Ok(())
            }
            TermPostings::Field { .. } => {
                Err(Error::invalid_operation("alignment pushed to field group"))
            }
        }
    }

    fn end_term(&mut self) -> Result<()> {
        Ok(())
    }
}
