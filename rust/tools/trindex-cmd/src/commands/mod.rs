//! Command implementations for trindex-cmd

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use trindex_postings::{
    JobConfig, PostingEmitter, Record, TaskCounters, TextDocument,
    collation::Collation,
    document::JsonLinesDocuments,
    worker::emit_batch,
};

pub mod emit;
pub mod postings;

/// Everything a run derives from the job configuration.
pub struct Job {
    pub config: JobConfig,
    pub emitter: PostingEmitter,
    pub collation: Box<dyn Collation>,
}

impl Job {
    pub fn load(config_path: &str) -> Result<Job> {
        let config = JobConfig::from_file(config_path)
            .with_context(|| format!("Failed to load job configuration: {config_path}"))?;
        Job::from_config(config)
    }

    pub fn from_config(config: JobConfig) -> Result<Job> {
        let catalog = config.field_catalog()?;
        let collation = config.collation()?;
        Ok(Job {
            config,
            emitter: PostingEmitter::new(catalog),
            collation,
        })
    }

    /// Reads every document of a JSON-lines file. Lines that fail to parse come back as
    /// `None` and are counted as parse failures by the emitter.
    pub fn read_documents(&self, input: &str) -> Result<Vec<Option<TextDocument>>> {
        let path = Path::new(input);
        if !path.is_file() {
            anyhow::bail!("Input is not a file: {input}");
        }
        let file = File::open(path).with_context(|| format!("Failed to open {input}"))?;
        let documents = JsonLinesDocuments::new(
            BufReader::new(file),
            self.emitter.catalog().clone(),
            self.config.field_tokenizers()?,
        )
        .collect::<trindex_common::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read documents from {input}"))?;
        log::info!("read {} documents from {input}", documents.len());
        Ok(documents)
    }

    pub fn emit(
        &self,
        documents: &[Option<TextDocument>],
        workers: Option<usize>,
    ) -> Result<(Vec<Record>, TaskCounters)> {
        Ok(emit_batch(&self.emitter, documents, workers)?)
    }
}

pub fn log_counters(counters: &TaskCounters) {
    for (name, value) in counters.report() {
        log::info!("{name}: {value}");
    }
}
