//! Tokenizers that turn field values into the token streams the emitter pulls from.
//!
//! Every tokenizer yields [`Token`]s: a term together with the separator text that follows
//! it in the source value. The emitter only indexes the term; the separator is carried
//! for consumers that rebuild field text (snippets, phrase display).
//!
//! The tokenizers return iterators of borrowed slices, so tokenizing a field value does
//! not allocate.

pub mod trivial;
pub mod unicode_word;

use trindex_common::{Result, error::Error};
pub use trivial::TrivialTokenizer;
pub use unicode_word::UnicodeWordTokenizer;

/// Default maximum length of a single term in bytes before truncation
pub const DEFAULT_MAX_TERM_LENGTH: usize = 128;

/// Default minimum length of a single term in bytes
pub const DEFAULT_MIN_TERM_LENGTH: usize = 1;

/// One step of a field's token stream.
///
/// `term` is `None` when the source could not produce a term for this step (for example a
/// null value inside a multi-valued field). Such a token is an anomaly, not the end of the
/// stream: the emitter logs it, skips it and keeps pulling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub term: Option<&'a str>,
    pub separator: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(term: &'a str, separator: &'a str) -> Token<'a> {
        Token {
            term: Some(term),
            separator,
        }
    }

    /// A token carrying no term.
    pub fn missing() -> Token<'a> {
        Token {
            term: None,
            separator: "",
        }
    }
}

/// A tokenizer extracts terms (with their trailing separators) from raw field values.
///
/// Terms longer than the maximum length are truncated at UTF-8 character boundaries.
/// Terms shorter than the minimum length are excluded entirely.
pub trait Tokenizer: Send + Sync {
    /// The iterator type returned by tokenize.
    type TokenIter<'a>: Iterator<Item = Token<'a>>
    where
        Self: 'a;

    /// Extract tokens from the input string. The yielded slices borrow from `input`.
    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a>;

    /// Get the kind of the tokenizer.
    fn kind(&self) -> TokenizerKind;

    /// Get the name of the tokenizer kind as a static string.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Maximum length of a single term in bytes; longer terms are truncated.
    fn max_term_length(&self) -> usize;

    /// Minimum length of a single term in bytes; shorter terms are dropped.
    fn min_term_length(&self) -> usize;
}

/// Creates a tokenizer with default term length limits from its configured name.
///
/// # Errors
/// Returns [`Error::invalid_config`] if the provided tokenizer name is not recognized.
pub fn create_tokenizer(name: &str) -> Result<TokenizerType> {
    create_tokenizer_with_lengths(name, DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
}

/// Creates a tokenizer from its configured name and explicit term length limits.
pub fn create_tokenizer_with_lengths(
    name: &str,
    max_term_length: usize,
    min_term_length: usize,
) -> Result<TokenizerType> {
    if max_term_length == 0 || min_term_length > max_term_length {
        return Err(Error::invalid_config(
            "term_length",
            format!("invalid term length range {min_term_length}..={max_term_length}"),
        ));
    }
    match name.try_into()? {
        TokenizerKind::Trivial => Ok(TokenizerType::Trivial(TrivialTokenizer::with_lengths(
            max_term_length,
            min_term_length,
        ))),
        TokenizerKind::UnicodeWord => Ok(TokenizerType::UnicodeWord(
            UnicodeWordTokenizer::with_lengths(max_term_length, min_term_length),
        )),
    }
}

/// Truncate a string slice to the maximum allowed length at a codepoint boundary.
///
/// If the input is longer than `max_term_length`, it is cut at the last UTF-8 character
/// boundary that fits within the limit, so the result is always valid UTF-8.
pub(crate) fn truncate_str(input: &str, max_term_length: usize) -> &str {
    if input.len() <= max_term_length {
        return input;
    }

    let mut boundary = max_term_length;
    while boundary > 0 && !input.is_char_boundary(boundary) {
        boundary -= 1;
    }

    &input[..boundary]
}

/// The tokenizer kinds available to a job configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// Emits the whole field value as a single term. Suited for identifiers (URIs, GUIDs).
    Trivial,
    /// Splits the value into maximal runs of alphanumeric characters.
    UnicodeWord,
}

impl TryFrom<&str> for TokenizerKind {
    type Error = trindex_common::error::Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "trivial" => Ok(TokenizerKind::Trivial),
            "unicode-word" => Ok(TokenizerKind::UnicodeWord),
            _ => Err(Error::invalid_config(
                "tokenizers",
                format!("Unrecognized tokenizer: {name}"),
            )),
        }
    }
}

impl TokenizerKind {
    /// Get the name of the tokenizer kind as a static string.
    pub const fn name(&self) -> &'static str {
        match self {
            TokenizerKind::Trivial => "trivial",
            TokenizerKind::UnicodeWord => "unicode-word",
        }
    }
}

/// Holds any of the available tokenizers behind a single concrete type, so a per-field
/// tokenizer list can be stored in one slice.
#[derive(Debug, Clone)]
pub enum TokenizerType {
    Trivial(TrivialTokenizer),
    UnicodeWord(UnicodeWordTokenizer),
}

impl Default for TokenizerType {
    fn default() -> Self {
        TokenizerType::UnicodeWord(UnicodeWordTokenizer::new())
    }
}

/// Token iterator over either tokenizer, without boxing.
pub enum TokenTypeIter<'a> {
    Trivial(<TrivialTokenizer as Tokenizer>::TokenIter<'a>),
    UnicodeWord(<UnicodeWordTokenizer as Tokenizer>::TokenIter<'a>),
}

impl<'a> Iterator for TokenTypeIter<'a> {
    type Item = Token<'a>;

    #[inline]
    fn next(&mut self) -> Option<Token<'a>> {
        match self {
            TokenTypeIter::Trivial(iter) => iter.next(),
            TokenTypeIter::UnicodeWord(iter) => iter.next(),
        }
    }
}

impl Tokenizer for TokenizerType {
    type TokenIter<'a> = TokenTypeIter<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        match self {
            TokenizerType::Trivial(tokenizer) => TokenTypeIter::Trivial(tokenizer.tokenize(input)),
            TokenizerType::UnicodeWord(tokenizer) => {
                TokenTypeIter::UnicodeWord(tokenizer.tokenize(input))
            }
        }
    }

    fn kind(&self) -> TokenizerKind {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.kind(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.kind(),
        }
    }

    fn max_term_length(&self) -> usize {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.max_term_length(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.max_term_length(),
        }
    }

    fn min_term_length(&self) -> usize {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.min_term_length(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.min_term_length(),
        }
    }
}
