//! The whole query value is one token.

use std::{borrow::Cow, iter};

use super::{DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Tokenizer, TokenizerKind, truncate_str};

/// Returns the input as a single token, truncated to the maximum length.
///
/// Inputs shorter than the minimum length produce no token. Suited to exact-match
/// keys such as identifiers.
pub struct TrivialTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl TrivialTokenizer {
    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }

    pub fn with_lengths(max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            max_term_length,
            min_term_length,
        }
    }
}

impl Default for TrivialTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for TrivialTokenizer {
    type TokenIter<'a> = iter::Flatten<iter::Once<Option<Cow<'a, str>>>>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        let token = (!input.is_empty() && input.len() >= self.min_term_length)
            .then(|| Cow::Borrowed(truncate_str(input, self.max_term_length)));
        iter::once(token).flatten()
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Trivial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(tokenizer: &TrivialTokenizer, input: &str) -> Vec<String> {
        tokenizer.tokenize(input).map(Cow::into_owned).collect()
    }

    #[test]
    fn test_trivial_tokenizer() {
        let tokenizer = TrivialTokenizer::new();
        assert_eq!(tokens(&tokenizer, "guid-12345-abcdef"), vec!["guid-12345-abcdef"]);
        assert!(tokens(&tokenizer, "").is_empty());
        assert_eq!(tokens(&tokenizer, "two words"), vec!["two words"]);
        assert_eq!(tokenizer.name(), "trivial");
    }

    #[test]
    fn test_lengths() {
        let tokenizer = TrivialTokenizer::with_lengths(5, 3);
        assert!(tokens(&tokenizer, "ab").is_empty());
        assert_eq!(tokens(&tokenizer, "abc"), vec!["abc"]);
        assert_eq!(tokens(&tokenizer, "this-is-long"), vec!["this-"]);
        assert_eq!(tokens(&tokenizer, "café-test"), vec!["café"]);
    }

    #[test]
    fn test_restartable() {
        let tokenizer = TrivialTokenizer::new();
        let first: Vec<_> = tokenizer.tokenize("value").collect();
        let second: Vec<_> = tokenizer.tokenize("value").collect();
        assert_eq!(first, second);
    }
}
