//! Observability side channel of the emitter: named counters and a progress status.
//!
//! The emitter reports through the [`TaskObserver`] it is handed on every call; it never
//! touches global state. [`TaskCounters`] is the standard worker-local implementation.
//! Each worker owns one, and the execution substrate sums them with [`TaskCounters::add`]
//! when the job completes.

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

/// Maximum number of term characters carried in the progress status.
pub const STATUS_TERM_CHARS: usize = 50;

/// Counters maintained by the posting emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Documents that were absent or had no subject.
    ParseFailures,
    /// Terms read and indexed, incremented as each occurrence record is written.
    IndexedOccurrences,
    /// Reserved name kept in counter reports; nothing increments it.
    ReservedNegativePredicateId,
    /// Documents that went through the field loop.
    ProcessedDocuments,
}

impl Counter {
    pub const ALL: [Counter; 4] = [
        Counter::ParseFailures,
        Counter::IndexedOccurrences,
        Counter::ReservedNegativePredicateId,
        Counter::ProcessedDocuments,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Counter::ParseFailures => "parse_failures",
            Counter::IndexedOccurrences => "indexed_occurrences",
            Counter::ReservedNegativePredicateId => "reserved_negative_predicate_id",
            Counter::ProcessedDocuments => "processed_documents",
        }
    }
}

/// Receives the emitter's counter increments and progress updates.
pub trait TaskObserver {
    fn increment(&self, counter: Counter, amount: u64);

    /// Advisory progress: the field being indexed and the current term. Called once per
    /// indexed term, so implementations should be cheap.
    fn set_status(&self, _field: &str, _term: &str) {}
}

/// Formats the progress status: `<field>=<first STATUS_TERM_CHARS characters of term>`.
pub fn format_status(out: &mut String, field: &str, term: &str) {
    let prefix = term
        .char_indices()
        .nth(STATUS_TERM_CHARS)
        .map_or(term, |(end, _)| &term[..end]);
    out.clear();
    out.push_str(field);
    out.push('=');
    out.push_str(prefix);
}

/// Worker-local counter set.
///
/// Counters are atomics so that the set can be shared by reference with the emitter while
/// the substrate reads it; all updates use relaxed ordering.
#[derive(Debug, Default)]
pub struct TaskCounters {
    parse_failures: AtomicU64,
    indexed_occurrences: AtomicU64,
    reserved_negative_predicate_id: AtomicU64,
    processed_documents: AtomicU64,
    /// Last progress status, present only when status tracking was requested.
    status: Option<Mutex<String>>,
}

impl TaskCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter set that also keeps the latest progress status.
    pub fn with_status() -> Self {
        TaskCounters {
            status: Some(Mutex::new(String::new())),
            ..Self::default()
        }
    }

    #[inline(always)]
    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::ParseFailures => &self.parse_failures,
            Counter::IndexedOccurrences => &self.indexed_occurrences,
            Counter::ReservedNegativePredicateId => &self.reserved_negative_predicate_id,
            Counter::ProcessedDocuments => &self.processed_documents,
        }
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    /// The latest progress status, if status tracking is enabled.
    pub fn status(&self) -> Option<String> {
        self.status
            .as_ref()
            .and_then(|status| status.lock().ok().map(|s| s.clone()))
    }

    /// Accumulates the counters of another worker into this one.
    pub fn add(&self, other: &TaskCounters) {
        for counter in Counter::ALL {
            self.slot(counter)
                .fetch_add(other.get(counter), Ordering::Relaxed);
        }
    }

    /// `(name, value)` pairs for every counter, in a fixed order.
    pub fn report(&self) -> Vec<(&'static str, u64)> {
        Counter::ALL
            .iter()
            .map(|counter| (counter.name(), self.get(*counter)))
            .collect()
    }
}

impl Clone for TaskCounters {
    fn clone(&self) -> Self {
        let cloned = TaskCounters {
            status: self.status().map(Mutex::new),
            ..Self::default()
        };
        cloned.add(self);
        cloned
    }
}

impl TaskObserver for TaskCounters {
    #[inline]
    fn increment(&self, counter: Counter, amount: u64) {
        self.slot(counter).fetch_add(amount, Ordering::Relaxed);
    }

    fn set_status(&self, field: &str, term: &str) {
        if let Some(Ok(mut status)) = self.status.as_ref().map(Mutex::lock) {
            format_status(&mut status, field, term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_add() {
        let a = TaskCounters::new();
        a.increment(Counter::IndexedOccurrences, 4);
        a.increment(Counter::ProcessedDocuments, 1);

        let b = TaskCounters::new();
        b.increment(Counter::ParseFailures, 2);
        b.increment(Counter::ProcessedDocuments, 3);

        a.add(&b);
        assert_eq!(a.get(Counter::IndexedOccurrences), 4);
        assert_eq!(a.get(Counter::ParseFailures), 2);
        assert_eq!(a.get(Counter::ProcessedDocuments), 4);
        assert_eq!(a.get(Counter::ReservedNegativePredicateId), 0);

        let cloned = a.clone();
        assert_eq!(cloned.report(), a.report());
        assert_eq!(a.report()[0], ("parse_failures", 2));
    }

    #[test]
    fn test_status_truncated_to_fifty_chars() {
        let counters = TaskCounters::with_status();
        assert_eq!(counters.status().as_deref(), Some(""));

        counters.set_status("title", "cat");
        assert_eq!(counters.status().as_deref(), Some("title=cat"));

        let long = "é".repeat(60);
        counters.set_status("body", &long);
        assert_eq!(
            counters.status().unwrap(),
            format!("body={}", "é".repeat(50))
        );

        let untracked = TaskCounters::new();
        untracked.set_status("title", "cat");
        assert_eq!(untracked.status(), None);
    }
}
