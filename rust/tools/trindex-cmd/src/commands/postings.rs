//! Postings command implementation

use anyhow::{Context, Result};
use std::io::{self, Write};

use trindex_postings::{
    postings::{CollectedPostings, assemble},
    shuffle::sort_records,
};

use super::{Job, log_counters};

pub fn run(config: String, input: String, workers: Option<usize>) -> Result<()> {
    let job = Job::load(&config)?;
    let documents = job.read_documents(&input)?;
    let (mut records, counters) = job.emit(&documents, workers)?;
    log_counters(&counters);

    let terms = merge(&job, &mut records)?;
    let mut out = io::stdout().lock();
    for term in &terms.terms {
        serde_json::to_writer(&mut out, term).context("Failed to serialize postings")?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Sorts the records the way the shuffle would and rebuilds the postings of every term.
fn merge(job: &Job, records: &mut [trindex_postings::Record]) -> Result<CollectedPostings> {
    sort_records(records, job.collation.as_ref());
    let mut sink = CollectedPostings::default();
    let stats = assemble(records, &mut sink).context("Record stream failed validation")?;
    log::info!(
        "{} groups: {} postings, {} alignments",
        stats.groups,
        stats.postings,
        stats.alignments
    );
    Ok(sink)
}
