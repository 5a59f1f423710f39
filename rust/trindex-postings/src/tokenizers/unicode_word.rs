//! Unicode Word Tokenizer - extracts alphanumeric words using Unicode properties.

use std::{iter::Peekable, str::CharIndices};

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Token, Tokenizer, TokenizerKind,
    truncate_str,
};

/// Word Tokenizer - extracts alphanumeric words from text.
///
/// A word is a longest run of alphanumeric characters; the run of non-alphanumeric
/// characters after it becomes the token's separator. Words longer than the maximum
/// length are truncated at UTF-8 character boundaries. A term that ends up shorter than the
/// minimum length after truncation (or empty, when the first character alone exceeds the
/// maximum) is skipped together with its separator.
#[derive(Debug, Clone)]
pub struct UnicodeWordTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl UnicodeWordTokenizer {
    /// Create a new UnicodeWordTokenizer with custom max and min term lengths.
    pub fn with_lengths(max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            max_term_length,
            min_term_length,
        }
    }

    /// Create a new UnicodeWordTokenizer with default settings.
    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }
}

impl Default for UnicodeWordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that yields word tokens from a string input.
pub struct WordTokenIterator<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    max_term_length: usize,
    min_term_length: usize,
}

impl<'a> WordTokenIterator<'a> {
    pub fn new(input: &'a str, max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            max_term_length,
            min_term_length,
        }
    }

    /// Advances while `pred` holds and returns the byte offset of the first char that
    /// fails it (or the input length).
    fn skip_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(pos, ch)) = self.chars.peek() {
            if !pred(ch) {
                return pos;
            }
            self.chars.next();
        }
        self.input.len()
    }
}

impl<'a> Iterator for WordTokenIterator<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.skip_while(|ch| !ch.is_alphanumeric());
            if start == self.input.len() {
                return None;
            }
            let end = self.skip_while(char::is_alphanumeric);
            let separator_end = self.skip_while(|ch| !ch.is_alphanumeric());

            let term = truncate_str(&self.input[start..end], self.max_term_length);
            if term.is_empty() || term.len() < self.min_term_length {
                continue;
            }
            return Some(Token::new(term, &self.input[end..separator_end]));
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenIter<'a> = WordTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        WordTokenIterator::new(input, self.max_term_length, self.min_term_length)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeWord
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}
