//! Documents consumed by the posting emitter.
//!
//! The emitter sees a document only through [`IndexableDocument`]: an id, an optional
//! subject, an index kind and one pull-based token stream per field. [`TextDocument`] is
//! the in-memory implementation used by the worker driver and the command-line tool; it
//! stores the raw values of every field and tokenizes them lazily with the field's
//! configured tokenizer.

use std::{collections::HashMap, io::BufRead, sync::Arc};

use serde::{Deserialize, Serialize};
use trindex_common::{Result, error::Error, try_or_ret_some_err};

use crate::{
    catalog::FieldCatalog,
    tokenizers::{Token, TokenTypeIter, Tokenizer, TokenizerType},
};

/// Controls whether a document produces alignment records in addition to its postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    Plain,
    /// The document also feeds the alignment index (term to field mapping).
    Aligned,
}

/// A parsed document, as seen by the posting emitter.
pub trait IndexableDocument {
    /// The token stream of one field.
    type Tokens<'a>: Iterator<Item = Token<'a>>
    where
        Self: 'a;

    /// Stable document id assigned by the pipeline.
    fn id(&self) -> u64;

    /// The document subject. `None` means the source could not be parsed.
    fn subject(&self) -> Option<&str>;

    fn index_kind(&self) -> IndexKind;

    /// Returns the token stream of the field at `field` (a field catalog index).
    /// Fields without content yield an empty stream.
    fn field_content(&self, field: usize) -> Self::Tokens<'_>;
}

/// In-memory document holding the raw values of each field.
///
/// A field may have several values (one per object of the predicate); their tokens form a
/// single stream, so positions keep increasing across values. A `None` value stands for an
/// object that could not be turned into text and surfaces as a token without a term.
#[derive(Debug, Clone)]
pub struct TextDocument {
    id: u64,
    subject: Option<String>,
    kind: IndexKind,
    fields: Vec<Vec<Option<String>>>,
    tokenizers: Arc<[TokenizerType]>,
}

impl TextDocument {
    /// Creates an empty document. `tokenizers` holds the tokenizer of every catalog field.
    pub fn new(id: u64, subject: Option<String>, tokenizers: Arc<[TokenizerType]>) -> Self {
        TextDocument {
            id,
            subject,
            kind: IndexKind::Plain,
            fields: Vec::new(),
            tokenizers,
        }
    }

    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    /// Appends a text value to the field at `field`.
    pub fn add_value(&mut self, field: usize, value: impl Into<String>) {
        self.values_mut(field).push(Some(value.into()));
    }

    /// Appends a value that has no text representation.
    pub fn add_missing_value(&mut self, field: usize) {
        self.values_mut(field).push(None);
    }

    pub fn values(&self, field: usize) -> &[Option<String>] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    fn values_mut(&mut self, field: usize) -> &mut Vec<Option<String>> {
        if field >= self.fields.len() {
            self.fields.resize_with(field + 1, Vec::new);
        }
        &mut self.fields[field]
    }
}

impl IndexableDocument for TextDocument {
    type Tokens<'a> = FieldTokens<'a>;

    fn id(&self) -> u64 {
        self.id
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn index_kind(&self) -> IndexKind {
        self.kind
    }

    fn field_content(&self, field: usize) -> FieldTokens<'_> {
        let tokenizer = self.tokenizers.get(field);
        if tokenizer.is_none() && !self.values(field).is_empty() {
            log::debug!(
                "document {}: no tokenizer for field #{field}, values ignored",
                self.id
            );
        }
        FieldTokens {
            tokenizer,
            values: self.values(field).iter(),
            current: None,
        }
    }
}

/// Token stream over all values of one field of a [`TextDocument`].
pub struct FieldTokens<'a> {
    tokenizer: Option<&'a TokenizerType>,
    values: std::slice::Iter<'a, Option<String>>,
    current: Option<TokenTypeIter<'a>>,
}

impl<'a> Iterator for FieldTokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let tokenizer = self.tokenizer?;
        loop {
            if let Some(token) = self.current.as_mut().and_then(Iterator::next) {
                return Some(token);
            }
            match self.values.next()? {
                Some(text) => self.current = Some(tokenizer.tokenize(text)),
                None => {
                    self.current = None;
                    return Some(Token::missing());
                }
            }
        }
    }
}

/// Serialized form of a document, one JSON object per line:
///
/// ```json
/// {"id": 7, "subject": "http://example.org/7", "kind": "aligned",
///  "fields": {"title": "Seven", "body": ["first value", null]}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub kind: IndexKind,
    #[serde(default)]
    pub fields: HashMap<String, FieldValues>,
}

/// The value(s) of one field in a [`SourceDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValues {
    One(Option<String>),
    Many(Vec<Option<String>>),
}

impl SourceDocument {
    /// Resolves field names against the catalog and builds the in-memory document.
    /// Fields that are not in the catalog are ignored.
    pub fn into_document(
        self,
        catalog: &FieldCatalog,
        tokenizers: &Arc<[TokenizerType]>,
    ) -> TextDocument {
        let mut document =
            TextDocument::new(self.id, self.subject, Arc::clone(tokenizers)).with_kind(self.kind);
        // Stable field order keeps value order independent of the map's iteration order.
        let mut fields = self
            .fields
            .into_iter()
            .filter_map(|(name, values)| match catalog.position(&name) {
                Some(field) => Some((field, values)),
                None => {
                    log::debug!("document {}: unknown field '{name}' ignored", self.id);
                    None
                }
            })
            .collect::<Vec<_>>();
        fields.sort_unstable_by_key(|(field, _)| *field);

        for (field, values) in fields {
            let values = match values {
                FieldValues::One(value) => vec![value],
                FieldValues::Many(values) => values,
            };
            for value in values {
                match value {
                    Some(text) => document.add_value(field, text),
                    None => document.add_missing_value(field),
                }
            }
        }
        document
    }
}

/// Reads JSON-lines documents.
///
/// Each item is `Ok(Some(document))` for a well-formed line, `Ok(None)` for a line that
/// failed to parse, including lines that are not valid UTF-8 (the emitter counts it as a
/// parse failure), and `Err` for I/O errors. Blank lines are skipped.
pub struct JsonLinesDocuments<R> {
    reader: R,
    catalog: FieldCatalog,
    tokenizers: Arc<[TokenizerType]>,
    line: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> JsonLinesDocuments<R> {
    pub fn new(reader: R, catalog: FieldCatalog, tokenizers: Arc<[TokenizerType]>) -> Self {
        JsonLinesDocuments {
            reader,
            catalog,
            tokenizers,
            line: Vec::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonLinesDocuments<R> {
    type Item = Result<Option<TextDocument>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            let read = try_or_ret_some_err!(
                self.reader
                    .read_until(b'\n', &mut self.line)
                    .map_err(|e| Error::io(format!("document line {}", self.line_number + 1), e))
            );
            if read == 0 {
                return None;
            }
            self.line_number += 1;
            let line = self.line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return match serde_json::from_slice::<SourceDocument>(line) {
                Ok(source) => Some(Ok(Some(
                    source.into_document(&self.catalog, &self.tokenizers),
                ))),
                Err(e) => {
                    log::warn!("document line {} failed parsing: {e}", self.line_number);
                    Some(Ok(None))
                }
            };
        }
    }
}
