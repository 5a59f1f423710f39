//! The posting emitter: turns one document into its stream of term records.
//!
//! For every indexed field of the document, the emitter pulls the field's token stream
//! and writes:
//!
//! - one `Occurrence` record per term read, at the term's position in the field;
//! - for aligned documents, one `PredicateId` record in the alignment slot the first time
//!   a term is seen in the field;
//! - once the field is exhausted, one `OccurrenceCount` and one `LastOccurrence` record
//!   per distinct term of the field.
//!
//! Positions start at 0 in every field and advance by one per term read. Tokens without a
//! term are logged and skipped without advancing the position. Per-term statistics live
//! only for the duration of one field.
//!
//! The emitter is stateless apart from the immutable field catalog, so one instance can be
//! shared by any number of workers.

use std::sync::Arc;

use ahash::AHashMap;
use trindex_common::Result;

use crate::{
    catalog::FieldCatalog,
    counters::{Counter, TaskObserver},
    document::{IndexKind, IndexableDocument},
    record::{FieldSlot, RecordSink, TermKey, TermValue},
};

/// Result of processing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// The document went through the field loop and produced `occurrences` occurrence
    /// records (possibly zero).
    Indexed { occurrences: u64 },
    /// The document was absent or had no subject; nothing was emitted.
    ParseFailure,
}

/// Per-term statistics of the field being processed.
struct TermStats {
    term: Arc<str>,
    count: u32,
    last: u32,
}

/// Per-term statistics of one field, in first-seen order.
///
/// Keys borrow from the document's field content, so looking a term up never allocates;
/// the shared term string is allocated once, on first sight, and reused by every record
/// of that term in the field.
#[derive(Default)]
struct FieldStats<'a> {
    index: AHashMap<&'a str, usize>,
    entries: Vec<TermStats>,
}

/// Emits the posting records of documents for one field catalog.
#[derive(Debug, Clone)]
pub struct PostingEmitter {
    catalog: FieldCatalog,
}

impl PostingEmitter {
    pub fn new(catalog: FieldCatalog) -> PostingEmitter {
        PostingEmitter { catalog }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Processes one document, writing its records to `sink`.
    ///
    /// A missing document, or one without a subject, is a parse failure: it is counted and
    /// logged, nothing is emitted, and `Ok(DocumentOutcome::ParseFailure)` is returned.
    ///
    /// # Errors
    ///
    /// Only errors raised by `sink` are returned. Records already written for the document
    /// stay with the sink.
    pub fn emit<D, S, O>(
        &self,
        document: Option<&D>,
        sink: &mut S,
        observer: &O,
    ) -> Result<DocumentOutcome>
    where
        D: IndexableDocument + ?Sized,
        S: RecordSink + ?Sized,
        O: TaskObserver + ?Sized,
    {
        let Some(document) = document.filter(|d| d.subject().is_some()) else {
            observer.increment(Counter::ParseFailures, 1);
            match document {
                Some(d) => log::warn!("document {} failed parsing: no subject", d.id()),
                None => log::warn!("document failed parsing"),
            }
            return Ok(DocumentOutcome::ParseFailure);
        };

        let mut occurrences = 0;
        for (field, field_name) in self.catalog.indexed_fields() {
            occurrences += self.emit_field(document, field, field_name, sink, observer)?;
        }

        observer.increment(Counter::ProcessedDocuments, 1);
        Ok(DocumentOutcome::Indexed { occurrences })
    }

    /// Emits the records of one indexed field and returns the number of terms read.
    fn emit_field<D, S, O>(
        &self,
        document: &D,
        field: usize,
        field_name: &str,
        sink: &mut S,
        observer: &O,
    ) -> Result<u64>
    where
        D: IndexableDocument + ?Sized,
        S: RecordSink + ?Sized,
        O: TaskObserver + ?Sized,
    {
        let doc = document.id();
        let slot = FieldSlot::field(field);
        let aligned = document.index_kind() == IndexKind::Aligned;

        let mut stats = FieldStats::default();
        let mut position = 0u32;

        for token in document.field_content(field) {
            let Some(term) = token.term else {
                log::warn!("document {doc}: field '{field_name}' yielded a token without a term");
                continue;
            };
            observer.set_status(field_name, term);

            let occurrence = TermValue::Occurrence { doc, position };
            match stats.index.get(term).copied() {
                Some(i) => {
                    let entry = &mut stats.entries[i];
                    sink.write(TermKey::new(entry.term.clone(), slot, &occurrence), occurrence)?;
                    entry.last = position;
                    entry.count += 1;
                }
                None => {
                    let shared: Arc<str> = term.into();
                    sink.write(TermKey::new(shared.clone(), slot, &occurrence), occurrence)?;
                    if aligned {
                        let predicate = TermValue::PredicateId { field: field as u32 };
                        sink.write(
                            TermKey::new(shared.clone(), FieldSlot::Alignment, &predicate),
                            predicate,
                        )?;
                    }
                    stats.index.insert(term, stats.entries.len());
                    stats.entries.push(TermStats {
                        term: shared,
                        count: 1,
                        last: position,
                    });
                }
            }
            position += 1;
            observer.increment(Counter::IndexedOccurrences, 1);
        }

        for entry in stats.entries {
            let count = TermValue::OccurrenceCount {
                doc,
                count: entry.count,
            };
            sink.write(TermKey::new(entry.term.clone(), slot, &count), count)?;

            let last = TermValue::LastOccurrence {
                doc,
                position: entry.last,
            };
            sink.write(TermKey::new(entry.term, slot, &last), last)?;
        }

        Ok(u64::from(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        counters::TaskCounters,
        record::Record,
        tokenizers::Token,
    };

    /// Document whose field streams are given token by token.
    struct ScriptedDocument {
        id: u64,
        subject: Option<&'static str>,
        kind: IndexKind,
        fields: Vec<Vec<Option<&'static str>>>,
    }

    impl IndexableDocument for ScriptedDocument {
        type Tokens<'a> = Box<dyn Iterator<Item = Token<'a>> + 'a>;

        fn id(&self) -> u64 {
            self.id
        }

        fn subject(&self) -> Option<&str> {
            self.subject
        }

        fn index_kind(&self) -> IndexKind {
            self.kind
        }

        fn field_content(&self, field: usize) -> Self::Tokens<'_> {
            let tokens = self.fields.get(field).map(Vec::as_slice).unwrap_or_default();
            Box::new(tokens.iter().map(|term| Token {
                term: *term,
                separator: " ",
            }))
        }
    }

    fn emit(
        fields: &[&str],
        document: Option<&ScriptedDocument>,
    ) -> (Vec<Record>, TaskCounters, DocumentOutcome) {
        let emitter = PostingEmitter::new(FieldCatalog::new(fields.iter().copied()).unwrap());
        let mut records = Vec::new();
        let counters = TaskCounters::with_status();
        let outcome = emitter.emit(document, &mut records, &counters).unwrap();
        (records, counters, outcome)
    }

    fn summary(records: &[Record]) -> Vec<(String, FieldSlot, TermValue)> {
        records
            .iter()
            .map(|r| (r.key.term().to_string(), r.key.slot(), r.value))
            .collect()
    }

    #[test]
    fn test_emission_sequence() {
        let document = ScriptedDocument {
            id: 5,
            subject: Some("s"),
            kind: IndexKind::Plain,
            fields: vec![vec![Some("b"), Some("a"), Some("b")]],
        };
        let (records, counters, outcome) = emit(&["f"], Some(&document));
        let f = FieldSlot::Field(0);
        assert_eq!(
            summary(&records),
            vec![
                ("b".into(), f, TermValue::Occurrence { doc: 5, position: 0 }),
                ("a".into(), f, TermValue::Occurrence { doc: 5, position: 1 }),
                ("b".into(), f, TermValue::Occurrence { doc: 5, position: 2 }),
                ("b".into(), f, TermValue::OccurrenceCount { doc: 5, count: 2 }),
                ("b".into(), f, TermValue::LastOccurrence { doc: 5, position: 2 }),
                ("a".into(), f, TermValue::OccurrenceCount { doc: 5, count: 1 }),
                ("a".into(), f, TermValue::LastOccurrence { doc: 5, position: 1 }),
            ]
        );
        assert_eq!(outcome, DocumentOutcome::Indexed { occurrences: 3 });
        assert_eq!(counters.get(Counter::IndexedOccurrences), 3);
        assert_eq!(counters.get(Counter::ProcessedDocuments), 1);
        assert_eq!(counters.status().as_deref(), Some("f=b"));
    }

    #[test]
    fn test_alignment_follows_first_occurrence() {
        let document = ScriptedDocument {
            id: 1,
            subject: Some("s"),
            kind: IndexKind::Aligned,
            fields: vec![vec![Some("x"), Some("x")]],
        };
        let (records, _, _) = emit(&["f"], Some(&document));
        let values: Vec<_> = records.iter().map(|r| (r.key.slot(), r.value)).collect();
        assert_eq!(
            &values[..3],
            &[
                (FieldSlot::Field(0), TermValue::Occurrence { doc: 1, position: 0 }),
                (FieldSlot::Alignment, TermValue::PredicateId { field: 0 }),
                (FieldSlot::Field(0), TermValue::Occurrence { doc: 1, position: 1 }),
            ]
        );
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_missing_term_does_not_advance_position() {
        let document = ScriptedDocument {
            id: 2,
            subject: Some("s"),
            kind: IndexKind::Plain,
            fields: vec![vec![Some("a"), None, Some("b")]],
        };
        let (records, counters, _) = emit(&["f"], Some(&document));
        let positions: Vec<_> = records
            .iter()
            .filter_map(|r| match r.value {
                TermValue::Occurrence { position, .. } => Some((r.key.term().to_string(), position)),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![("a".into(), 0), ("b".into(), 1)]);
        assert_eq!(counters.get(Counter::IndexedOccurrences), 2);
    }

    #[test]
    fn test_document_without_subject() {
        let document = ScriptedDocument {
            id: 3,
            subject: None,
            kind: IndexKind::Aligned,
            fields: vec![vec![Some("a")]],
        };
        let (records, counters, outcome) = emit(&["f"], Some(&document));
        assert!(records.is_empty());
        assert_eq!(outcome, DocumentOutcome::ParseFailure);
        assert_eq!(counters.get(Counter::ParseFailures), 1);
        assert_eq!(counters.get(Counter::ProcessedDocuments), 0);
    }

    #[test]
    fn test_occurrences_counted_before_sink_failure() {
        /// Accepts `capacity` records, then fails.
        struct BoundedSink {
            records: Vec<Record>,
            capacity: usize,
        }
        impl RecordSink for BoundedSink {
            fn write(&mut self, key: TermKey, value: TermValue) -> Result<()> {
                if self.records.len() == self.capacity {
                    return Err(trindex_common::error::Error::invalid_operation("sink full"));
                }
                self.records.push(Record { key, value });
                Ok(())
            }
        }

        let document = ScriptedDocument {
            id: 7,
            subject: Some("s"),
            kind: IndexKind::Plain,
            fields: vec![vec![Some("a"), Some("b"), Some("c")]],
        };
        let emitter = PostingEmitter::new(FieldCatalog::new(["f"]).unwrap());
        let counters = TaskCounters::new();
        let mut sink = BoundedSink {
            records: Vec::new(),
            capacity: 2,
        };
        assert!(emitter.emit(Some(&document), &mut sink, &counters).is_err());
        assert_eq!(sink.records.len(), 2);
        assert_eq!(counters.get(Counter::IndexedOccurrences), 2);
        assert_eq!(counters.get(Counter::ProcessedDocuments), 0);
    }

    #[test]
    fn test_sink_errors_propagate() {
        struct FailingSink;
        impl RecordSink for FailingSink {
            fn write(&mut self, _: TermKey, _: TermValue) -> Result<()> {
                Err(trindex_common::error::Error::invalid_operation("sink closed"))
            }
        }

        let document = ScriptedDocument {
            id: 4,
            subject: Some("s"),
            kind: IndexKind::Plain,
            fields: vec![vec![Some("a")]],
        };
        let emitter = PostingEmitter::new(FieldCatalog::new(["f"]).unwrap());
        let counters = TaskCounters::new();
        assert!(
            emitter
                .emit(Some(&document), &mut FailingSink, &counters)
                .is_err()
        );
        assert_eq!(counters.get(Counter::ProcessedDocuments), 0);
    }
}
