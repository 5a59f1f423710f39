//! Trivial Tokenizer - returns the input as a single term.

use std::iter;

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Token, Tokenizer, TokenizerKind,
    truncate_str,
};

/// Trivial Tokenizer - returns each field value unchanged (or truncated) as one term.
///
/// Well suited for fields holding identifiers such as resource URIs, where the whole
/// value is the only meaningful term. A value whose truncated form is empty or shorter
/// than the minimum length produces no token.
#[derive(Debug, Clone)]
pub struct TrivialTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl TrivialTokenizer {
    pub fn with_lengths(max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            max_term_length,
            min_term_length,
        }
    }

    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }
}

impl Default for TrivialTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for TrivialTokenizer {
    type TokenIter<'a> = iter::Take<iter::Once<Token<'a>>>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        let term = truncate_str(input, self.max_term_length);
        if term.is_empty() || term.len() < self.min_term_length {
            iter::once(Token::missing()).take(0)
        } else {
            iter::once(Token::new(term, "")).take(1)
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Trivial
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_tokenizer() {
        let tokenizer = TrivialTokenizer::new();

        let tokens: Vec<_> = tokenizer.tokenize("http://example.org/x y").collect();
        assert_eq!(tokens, vec![Token::new("http://example.org/x y", "")]);

        assert_eq!(tokenizer.tokenize("").count(), 0);
        assert_eq!(tokenizer.name(), "trivial");
    }

    #[test]
    fn test_trivial_tokenizer_limits() {
        let tokenizer = TrivialTokenizer::with_lengths(5, 3);
        assert_eq!(tokenizer.tokenize("ab").count(), 0);

        let terms: Vec<_> = tokenizer.tokenize("abcdefgh").filter_map(|t| t.term).collect();
        assert_eq!(terms, vec!["abcde"]);
    }

    #[test]
    fn test_trivial_truncation_never_yields_empty_term() {
        let tokenizer = TrivialTokenizer::with_lengths(2, 1);
        assert_eq!(tokenizer.tokenize("世界").count(), 0);
        let terms: Vec<_> = tokenizer.tokenize("ab世").filter_map(|t| t.term).collect();
        assert_eq!(terms, vec!["ab"]);
    }
}
