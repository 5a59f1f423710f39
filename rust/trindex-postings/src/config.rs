//! Job configuration for a posting-emission run.
//!
//! The configuration is a small JSON document read once when a worker starts:
//!
//! ```json
//! {
//!     "fields": ["subject", "title", "NOINDEX_raw", "body"],
//!     "tokenizers": ["trivial", "unicode-word", "unicode-word", "unicode-word"],
//!     "collation": "binary",
//!     "max_term_length": 128
//! }
//! ```
//!
//! Everything derived from it (the field catalog, per-field tokenizers, the collation) is
//! immutable for the lifetime of the worker. Any problem with the configuration is reported
//! as an `InvalidConfiguration` error, which is fatal to the worker.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use trindex_common::{Result, error::Error};

use crate::{
    catalog::FieldCatalog,
    collation::{self, Collation},
    tokenizers::{
        self, DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, TokenizerKind, TokenizerType,
    },
};

/// Configuration parameters of a posting-emission job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Ordered field names. The position in this list is the field index.
    pub fields: Vec<String>,

    /// Field tokenizers to use when breaking field values into terms, one per field.
    /// When empty, every field uses the `unicode-word` tokenizer.
    #[serde(default)]
    pub tokenizers: Vec<String>,

    /// The name of the collation the shuffle and merge stages order terms by.
    #[serde(default = "JobConfig::default_collation")]
    pub collation: String,

    /// Maximum term length in bytes; longer terms are truncated.
    #[serde(default)]
    pub max_term_length: Option<usize>,

    /// Minimum term length in bytes; shorter terms are dropped by the tokenizer.
    #[serde(default)]
    pub min_term_length: Option<usize>,
}

impl JobConfig {
    fn default_collation() -> String {
        collation::CollationKind::Binary.name().to_string()
    }

    /// Creates a configuration for the given fields with default settings.
    pub fn with_fields<I, S>(fields: I) -> JobConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JobConfig {
            fields: fields.into_iter().map(Into::into).collect(),
            tokenizers: Vec::new(),
            collation: Self::default_collation(),
            max_term_length: None,
            min_term_length: None,
        }
    }

    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<JobConfig> {
        let config: JobConfig = serde_json::from_str(json)
            .map_err(|e| Error::invalid_config("job", format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<JobConfig> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(
                "job",
                format!("cannot read configuration {}: {e}", path.display()),
            )
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "loaded job configuration {}: {} fields, collation {}",
            path.display(),
            config.fields.len(),
            config.collation
        );
        Ok(config)
    }

    /// Checks that every derived component can be built.
    pub fn validate(&self) -> Result<()> {
        self.field_catalog()?;
        self.field_tokenizers()?;
        self.collation()?;
        Ok(())
    }

    pub fn field_catalog(&self) -> Result<FieldCatalog> {
        FieldCatalog::new(self.fields.iter().cloned())
    }

    /// Builds the tokenizer for every field, in catalog order.
    pub fn field_tokenizers(&self) -> Result<Arc<[TokenizerType]>> {
        let max_term_length = self.max_term_length.unwrap_or(DEFAULT_MAX_TERM_LENGTH);
        let min_term_length = self.min_term_length.unwrap_or(DEFAULT_MIN_TERM_LENGTH);

        if self.tokenizers.is_empty() {
            let default = tokenizers::create_tokenizer_with_lengths(
                TokenizerKind::UnicodeWord.name(),
                max_term_length,
                min_term_length,
            )?;
            return Ok(vec![default; self.fields.len()].into());
        }

        if self.tokenizers.len() != self.fields.len() {
            return Err(Error::invalid_config(
                "tokenizers",
                format!(
                    "expected {} tokenizers (one per field), got {}",
                    self.fields.len(),
                    self.tokenizers.len()
                ),
            ));
        }
        self.tokenizers
            .iter()
            .map(|name| {
                tokenizers::create_tokenizer_with_lengths(name, max_term_length, min_term_length)
            })
            .collect::<Result<Vec<_>>>()
            .map(Into::into)
    }

    pub fn collation(&self) -> Result<Box<dyn Collation>> {
        collation::create_collation(&self.collation)
    }
}
