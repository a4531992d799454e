//! Words as maximal runs of alphanumeric characters.

use std::{borrow::Cow, str::CharIndices};

use super::{DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Tokenizer, TokenizerKind, truncate_str};

/// Extracts the longest runs of Unicode alphanumeric characters.
///
/// Words longer than the maximum length are truncated at a char boundary; words
/// shorter than the minimum length are skipped. With lowercasing enabled, words
/// that contain uppercase characters are returned as owned lowercase strings.
pub struct UnicodeWordTokenizer {
    max_term_length: usize,
    min_term_length: usize,
    lowercase: bool,
}

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }

    pub fn with_lengths(max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            max_term_length,
            min_term_length,
            lowercase: false,
        }
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
}

impl Default for UnicodeWordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WordTokenIterator<'a> {
    input: &'a str,
    chars: CharIndices<'a>,
    max_term_length: usize,
    min_term_length: usize,
    lowercase: bool,
}

impl<'a> WordTokenIterator<'a> {
    fn next_word(&mut self) -> Option<&'a str> {
        let mut start = None;
        for (pos, ch) in self.chars.by_ref() {
            match (ch.is_alphanumeric(), start) {
                (true, None) => start = Some(pos),
                (false, Some(s)) => return Some(&self.input[s..pos]),
                _ => {}
            }
        }
        start.map(|s| &self.input[s..])
    }
}

impl<'a> Iterator for WordTokenIterator<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Cow<'a, str>> {
        loop {
            let word = self.next_word()?;
            if word.len() < self.min_term_length {
                continue;
            }
            let word = truncate_str(word, self.max_term_length);
            if self.lowercase && word.chars().any(char::is_uppercase) {
                return Some(Cow::Owned(word.to_lowercase()));
            }
            return Some(Cow::Borrowed(word));
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenIter<'a> = WordTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        WordTokenIterator {
            input,
            chars: input.char_indices(),
            max_term_length: self.max_term_length,
            min_term_length: self.min_term_length,
            lowercase: self.lowercase,
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeWord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(tokenizer: &UnicodeWordTokenizer, input: &str) -> Vec<String> {
        tokenizer.tokenize(input).map(Cow::into_owned).collect()
    }

    #[test]
    fn test_words() {
        let tokenizer = UnicodeWordTokenizer::new();
        assert_eq!(
            tokens(&tokenizer, "Typically 3-4 levels deep,"),
            vec!["Typically", "3", "4", "levels", "deep"]
        );
        assert!(tokens(&tokenizer, "").is_empty());
        assert!(tokens(&tokenizer, "!@#$%^&*()").is_empty());
        assert_eq!(
            tokens(&tokenizer, "café naïve résumé"),
            vec!["café", "naïve", "résumé"]
        );
        assert_eq!(
            tokens(&tokenizer, "你好，世界！这是测试。"),
            vec!["你好", "世界", "这是测试"]
        );
        assert_eq!(tokenizer.name(), "unicode-word");
    }

    #[test]
    fn test_duplicates_are_kept() {
        let tokenizer = UnicodeWordTokenizer::new();
        assert_eq!(tokens(&tokenizer, "to be or not to be"), vec![
            "to", "be", "or", "not", "to", "be"
        ]);
    }

    #[test]
    fn test_lengths() {
        let tokenizer = UnicodeWordTokenizer::with_lengths(3, 2);
        assert_eq!(
            tokens(&tokenizer, "a cat elephant ox"),
            vec!["cat", "ele", "ox"]
        );
        assert_eq!(tokens(&tokenizer, "café"), vec!["caf"]);
    }

    #[test]
    fn test_lowercase() {
        let tokenizer = UnicodeWordTokenizer::new().with_lowercase(true);
        let words: Vec<_> = tokenizer.tokenize("Hello world MÜNCHEN").collect();
        assert!(matches!(words[0], Cow::Owned(_)));
        assert!(matches!(words[1], Cow::Borrowed("world")));
        assert_eq!(words[2], "münchen");
    }
}
