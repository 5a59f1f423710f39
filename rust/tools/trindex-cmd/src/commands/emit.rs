//! Emit command implementation

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use trindex_postings::{Record, record::JsonLinesSink, shuffle::sort_records};

use super::{Job, log_counters};

pub fn run(
    config: String,
    input: String,
    output: Option<String>,
    sorted: bool,
    workers: Option<usize>,
) -> Result<()> {
    let job = Job::load(&config)?;
    let documents = job.read_documents(&input)?;
    let (mut records, counters) = job.emit(&documents, workers)?;
    if sorted {
        sort_records(&mut records, job.collation.as_ref());
    }

    let written = match &output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create output: {path}"))?;
            write_records(&records, BufWriter::new(file))?
        }
        None => write_records(&records, io::stdout().lock())?,
    };
    log::info!(
        "{written} records written to {}",
        output.as_deref().unwrap_or("stdout")
    );
    log_counters(&counters);
    Ok(())
}

fn write_records<W: Write>(records: &[Record], writer: W) -> Result<u64> {
    let mut sink = JsonLinesSink::new(writer);
    for record in records {
        sink.write_record(record)?;
    }
    let written = sink.written();
    sink.into_inner()?;
    Ok(written)
}
