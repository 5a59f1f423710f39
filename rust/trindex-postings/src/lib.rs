//! Posting-record emission for the inverted-index build over structured documents.
//!
//! The map side of the index build: every document is split into named fields, each
//! field is tokenized, and [`PostingEmitter`] turns the token streams into
//! `(TermKey, TermValue)` records that a sort-and-group substrate routes to the merge
//! stage. The record layout and its ordering contract live in [`record`]; [`shuffle`] and
//! [`postings`] provide an in-process stand-in for the substrate and the merge stage.

pub mod catalog;
pub mod collation;
pub mod config;
pub mod counters;
pub mod document;
pub mod emitter;
pub mod postings;
pub mod record;
pub mod shuffle;
pub mod tokenizers;
pub mod worker;

pub use catalog::{FieldCatalog, NO_INDEX_PREFIX};
pub use config::JobConfig;
pub use counters::{Counter, TaskCounters, TaskObserver};
pub use document::{IndexKind, IndexableDocument, TextDocument};
pub use emitter::{DocumentOutcome, PostingEmitter};
pub use record::{FieldSlot, Record, RecordSink, TermKey, TermValue};
