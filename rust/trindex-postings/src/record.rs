//! Emitted records and the key ordering contract between the emitter and the merge stage.
//!
//! Every record is a `(TermKey, TermValue)` pair. Sorting records by key must make each
//! `(term, slot)` group contiguous and order its values so that the merge stage can build
//! a term's postings in one forward pass, without buffering:
//!
//! 1. **term**, by the job's collation (byte order by default);
//! 2. **slot**, with [`FieldSlot::Alignment`] before every real field;
//! 3. **value order** ([`ValueOrder`]): document id, then value rank
//!    (`PredicateId` < `OccurrenceCount` < `Occurrence` < `LastOccurrence`), then the
//!    value's ordinal (position, count or field index).
//!
//! Inside a field group the merge stage therefore sees, for each document in ascending id
//! order, the occurrence count first, then every position in ascending order, then the
//! last position. Any other merge stage implementation must use the same scheme.

use std::{cmp::Ordering, io::Write, sync::Arc};

use serde::{Deserialize, Serialize};
use trindex_common::{Result, error::Error};

use crate::collation::Collation;

/// Second component of a record key: a field index or the alignment slot.
///
/// The alignment slot orders before every field, so a term's alignment records form their
/// own group that never interleaves with the term's positional postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSlot {
    Alignment,
    Field(u32),
}

impl FieldSlot {
    pub fn field(field: usize) -> FieldSlot {
        FieldSlot::Field(field as u32)
    }

    pub fn field_index(&self) -> Option<usize> {
        match self {
            FieldSlot::Alignment => None,
            FieldSlot::Field(field) => Some(*field as usize),
        }
    }
}

/// The payload of an emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermValue {
    /// Alignment record: the term occurs in field `field`.
    PredicateId { field: u32 },
    /// The term occurs in document `doc` at `position` of the record's field.
    Occurrence { doc: u64, position: u32 },
    /// Number of occurrences of the term in the record's field of document `doc`.
    OccurrenceCount { doc: u64, count: u32 },
    /// Position of the final occurrence of the term in the record's field of `doc`.
    LastOccurrence { doc: u64, position: u32 },
}

impl TermValue {
    /// The document this value belongs to; alignment values carry none.
    pub fn doc(&self) -> Option<u64> {
        match *self {
            TermValue::PredicateId { .. } => None,
            TermValue::Occurrence { doc, .. }
            | TermValue::OccurrenceCount { doc, .. }
            | TermValue::LastOccurrence { doc, .. } => Some(doc),
        }
    }

    /// The ordering hint this value contributes to its key.
    pub fn order(&self) -> ValueOrder {
        match *self {
            TermValue::PredicateId { field } => ValueOrder {
                doc: 0,
                rank: ValueRank::PredicateId,
                ordinal: field,
            },
            TermValue::OccurrenceCount { doc, count } => ValueOrder {
                doc,
                rank: ValueRank::OccurrenceCount,
                ordinal: count,
            },
            TermValue::Occurrence { doc, position } => ValueOrder {
                doc,
                rank: ValueRank::Occurrence,
                ordinal: position,
            },
            TermValue::LastOccurrence { doc, position } => ValueOrder {
                doc,
                rank: ValueRank::LastOccurrence,
                ordinal: position,
            },
        }
    }
}

/// Rank of a value kind inside one document's run of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueRank {
    PredicateId = 0,
    OccurrenceCount = 1,
    Occurrence = 2,
    LastOccurrence = 3,
}

/// Third key component, derived from the value: `(doc, rank, ordinal)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueOrder {
    pub doc: u64,
    pub rank: ValueRank,
    pub ordinal: u32,
}

/// Composite sort/group key of an emitted record.
///
/// The derived `Ord` compares terms byte-wise; use [`TermKey::compare_with`] to sort by a
/// configured [`Collation`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermKey {
    term: Arc<str>,
    slot: FieldSlot,
    order: ValueOrder,
}

impl TermKey {
    pub fn new(term: Arc<str>, slot: FieldSlot, value: &TermValue) -> TermKey {
        TermKey {
            term,
            slot,
            order: value.order(),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn slot(&self) -> FieldSlot {
        self.slot
    }

    pub fn order(&self) -> ValueOrder {
        self.order
    }

    /// Full key comparison with the term compared by `collation`.
    pub fn compare_with(&self, other: &TermKey, collation: &dyn Collation) -> Ordering {
        self.compare_group(other, collation)
            .then_with(|| self.order.cmp(&other.order))
    }

    /// Compares only the `(term, slot)` group part of the keys.
    pub fn compare_group(&self, other: &TermKey, collation: &dyn Collation) -> Ordering {
        collation
            .compare(&self.term, &other.term)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

/// One emitted `(key, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub key: TermKey,
    pub value: TermValue,
}

impl Record {
    pub fn new(term: Arc<str>, slot: FieldSlot, value: TermValue) -> Record {
        Record {
            key: TermKey::new(term, slot, &value),
            value,
        }
    }
}

/// Wire form of a record in JSON-lines output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLine {
    pub term: String,
    pub slot: FieldSlot,
    pub value: TermValue,
}

impl From<&Record> for RecordLine {
    fn from(record: &Record) -> Self {
        RecordLine {
            term: record.key.term().to_string(),
            slot: record.key.slot(),
            value: record.value,
        }
    }
}

impl From<RecordLine> for Record {
    fn from(line: RecordLine) -> Self {
        Record::new(line.term.into(), line.slot, line.value)
    }
}

/// Destination of emitted records, provided by the execution substrate.
///
/// Ownership of every record passes to the sink; the emitter never reads it back.
pub trait RecordSink {
    fn write(&mut self, key: TermKey, value: TermValue) -> Result<()>;
}

impl RecordSink for Vec<Record> {
    #[inline]
    fn write(&mut self, key: TermKey, value: TermValue) -> Result<()> {
        self.push(Record { key, value });
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    #[inline]
    fn write(&mut self, key: TermKey, value: TermValue) -> Result<()> {
        (**self).write(key, value)
    }
}

/// Sink writing one JSON object per record.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &RecordLine::from(record))
            .map_err(|e| Error::json("record", e))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::io("record", e))?;
        self.written += 1;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush().map_err(|e| Error::io("flush", e))?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write(&mut self, key: TermKey, value: TermValue) -> Result<()> {
        self.write_record(&Record { key, value })
    }
}
