//! Batch driver: runs the emitter over many documents, optionally in parallel.
//!
//! Each unit of work owns its sink and its counter set; nothing mutable is shared between
//! workers. Records of a chunk keep the per-document emission order, and chunks are
//! concatenated in input order, so the output equals a sequential run.

use rayon::prelude::*;
use trindex_common::Result;

use crate::{
    counters::TaskCounters,
    document::IndexableDocument,
    emitter::PostingEmitter,
    record::Record,
};

/// Emits the records of `documents`.
///
/// `max_degree` bounds the number of chunks processed concurrently. `None` uses the rayon
/// pool's thread count; `1` or less, or a batch of at most one document, runs sequentially
/// on the calling thread. `None` entries are parse failures.
pub fn emit_batch<D>(
    emitter: &PostingEmitter,
    documents: &[Option<D>],
    max_degree: Option<usize>,
) -> Result<(Vec<Record>, TaskCounters)>
where
    D: IndexableDocument + Sync,
{
    let degree = max_degree.unwrap_or_else(rayon::current_num_threads);
    if documents.len() <= 1 || degree <= 1 {
        return emit_chunk(emitter, documents);
    }

    let chunk_size = documents.len().div_ceil(degree);
    log::debug!(
        "emitting {} documents in chunks of {chunk_size}",
        documents.len()
    );
    let chunks = documents
        .par_chunks(chunk_size)
        .map(|chunk| emit_chunk(emitter, chunk))
        .collect::<Result<Vec<_>>>()?;

    let counters = TaskCounters::new();
    let mut records = Vec::with_capacity(chunks.iter().map(|(r, _)| r.len()).sum());
    for (chunk_records, chunk_counters) in chunks {
        records.extend(chunk_records);
        counters.add(&chunk_counters);
    }
    Ok((records, counters))
}

fn emit_chunk<D: IndexableDocument>(
    emitter: &PostingEmitter,
    documents: &[Option<D>],
) -> Result<(Vec<Record>, TaskCounters)> {
    let mut records = Vec::new();
    let counters = TaskCounters::new();
    for document in documents {
        emitter.emit(document.as_ref(), &mut records, &counters)?;
    }
    Ok((records, counters))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        catalog::FieldCatalog,
        counters::Counter,
        document::{IndexKind, TextDocument},
        tokenizers::TokenizerType,
    };

    fn documents(count: u64) -> Vec<Option<TextDocument>> {
        let tokenizers: Arc<[TokenizerType]> = vec![TokenizerType::default(); 2].into();
        (0..count)
            .map(|id| {
                if id % 7 == 3 {
                    return None;
                }
                let mut doc = TextDocument::new(id, Some(format!("s{id}")), tokenizers.clone());
                if id % 2 == 0 {
                    doc = doc.with_kind(IndexKind::Aligned);
                }
                doc.add_value(0, format!("w{} w{} shared", id % 5, id % 3));
                doc.add_value(1, "shared tail");
                Some(doc)
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let emitter = PostingEmitter::new(FieldCatalog::new(["title", "body"]).unwrap());
        let docs = documents(50);

        let (sequential, seq_counters) = emit_batch(&emitter, &docs, Some(1)).unwrap();
        let (parallel, par_counters) = emit_batch(&emitter, &docs, Some(4)).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(seq_counters.report(), par_counters.report());
        assert_eq!(par_counters.get(Counter::ParseFailures), 7);
        assert_eq!(par_counters.get(Counter::ProcessedDocuments), 43);
        assert_eq!(par_counters.get(Counter::IndexedOccurrences), 43 * 5);
    }

    #[test]
    fn test_empty_batch() {
        let emitter = PostingEmitter::new(FieldCatalog::new(["title"]).unwrap());
        let (records, counters) =
            emit_batch::<TextDocument>(&emitter, &[], None).unwrap();
        assert!(records.is_empty());
        assert_eq!(counters.get(Counter::ProcessedDocuments), 0);
    }
}
