//! Character q-grams, the token set behind edit-distance search.

use std::borrow::Cow;

use tocc_common::{Result, verify_arg};

use super::{Tokenizer, TokenizerKind};

const PRE_PAD: char = '#';
const POST_PAD: char = '$';

/// Splits the lowercased input into overlapping grams of `gram_length` characters.
///
/// With padding, `gram_length - 1` copies of `#` are prepended and of `$` appended,
/// so an input of `n` characters yields `n + gram_length - 1` grams and every
/// character appears at every gram position. Without padding an input shorter than
/// `gram_length` yields no grams.
pub struct NGramTokenizer {
    gram_length: usize,
    pre_post_padding: bool,
}

impl NGramTokenizer {
    pub fn new(gram_length: usize, pre_post_padding: bool) -> Result<Self> {
        verify_arg!(gram_length, gram_length > 0);
        Ok(Self {
            gram_length,
            pre_post_padding,
        })
    }

    pub fn gram_length(&self) -> usize {
        self.gram_length
    }

    /// Number of grams produced for an input of `num_chars` characters.
    pub fn num_grams(&self, num_chars: usize) -> usize {
        if self.pre_post_padding {
            if num_chars == 0 {
                0
            } else {
                num_chars + self.gram_length - 1
            }
        } else {
            (num_chars + 1).saturating_sub(self.gram_length)
        }
    }
}

pub struct NGramIterator {
    chars: Vec<char>,
    gram_length: usize,
    pos: usize,
}

impl Iterator for NGramIterator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let gram = self.chars.get(self.pos..self.pos + self.gram_length)?;
        self.pos += 1;
        Some(gram.iter().collect())
    }
}

impl Tokenizer for NGramTokenizer {
    type TokenIter<'a> = std::iter::Map<NGramIterator, fn(String) -> Cow<'a, str>>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        let pad = if self.pre_post_padding && !input.is_empty() {
            self.gram_length - 1
        } else {
            0
        };
        let mut chars = Vec::with_capacity(input.len() + 2 * pad);
        chars.extend(std::iter::repeat_n(PRE_PAD, pad));
        chars.extend(input.chars().flat_map(char::to_lowercase));
        chars.extend(std::iter::repeat_n(POST_PAD, pad));
        NGramIterator {
            chars,
            gram_length: self.gram_length,
            pos: 0,
        }
        .map(Cow::Owned as fn(String) -> Cow<'a, str>)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Ngram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(tokenizer: &NGramTokenizer, input: &str) -> Vec<String> {
        tokenizer.tokenize(input).map(Cow::into_owned).collect()
    }

    #[test]
    fn test_padded_grams() {
        let tokenizer = NGramTokenizer::new(3, true).unwrap();
        assert_eq!(
            grams(&tokenizer, "Abc"),
            vec!["##a", "#ab", "abc", "bc$", "c$$"]
        );
        assert_eq!(tokenizer.num_grams(3), 5);
        assert!(grams(&tokenizer, "").is_empty());
        assert_eq!(grams(&tokenizer, "x"), vec!["##x", "#x$", "x$$"]);
    }

    #[test]
    fn test_unpadded_grams() {
        let tokenizer = NGramTokenizer::new(2, false).unwrap();
        assert_eq!(grams(&tokenizer, "héllo"), vec!["hé", "él", "ll", "lo"]);
        assert_eq!(tokenizer.num_grams(5), 4);
        assert!(grams(&tokenizer, "a").is_empty());
        assert_eq!(tokenizer.num_grams(1), 0);
    }

    #[test]
    fn test_repeated_grams_are_kept() {
        let tokenizer = NGramTokenizer::new(2, false).unwrap();
        assert_eq!(grams(&tokenizer, "aaa"), vec!["aa", "aa"]);
        assert!(NGramTokenizer::new(0, true).is_err());
    }
}
