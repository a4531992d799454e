//! Query tokenizers.
//!
//! A tokenizer turns the query value into the sequence of tokens whose postings
//! lists are merged. Tokens are not deduplicated: a token produced twice occupies
//! two cursor slots and counts twice toward the occurrence threshold.
//!
//! The same tokenizer (and configuration) must be used to build the postings that
//! the queries run against.

pub mod ngram;
pub mod trivial;
pub mod unicode_word;

use std::borrow::Cow;

use serde::Deserialize;
use tocc_common::{Result, error::Error, verify_arg};

pub use ngram::NGramTokenizer;
pub use trivial::TrivialTokenizer;
pub use unicode_word::UnicodeWordTokenizer;

/// Default maximum length of a single token in bytes before truncation.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 128;

/// Default minimum length of a single token in bytes.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 1;

/// Default gram length of the n-gram tokenizer.
pub const DEFAULT_GRAM_LENGTH: usize = 3;

/// Extracts tokens from a query string.
///
/// Tokenization is lazy and restartable: every call to [`tokenize`](Self::tokenize)
/// starts over from the beginning of the input. Tokens borrow from the input when
/// they are plain substrings of it.
pub trait Tokenizer: Send + Sync {
    type TokenIter<'a>: Iterator<Item = Cow<'a, str>>
    where
        Self: 'a;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a>;

    fn kind(&self) -> TokenizerKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Creates a tokenizer with default settings from its name.
pub fn create_tokenizer(name: &str) -> Result<TokenizerType> {
    TokenizerConfig {
        kind: name.try_into()?,
        ..Default::default()
    }
    .build()
}

/// Truncates a string slice to at most `max_term_length` bytes on a char boundary.
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerKind {
    /// The whole input is a single token.
    Trivial,
    /// Maximal runs of alphanumeric characters.
    #[default]
    UnicodeWord,
    /// Overlapping character q-grams.
    Ngram,
}

impl TryFrom<&str> for TokenizerKind {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "trivial" => Ok(TokenizerKind::Trivial),
            "unicode-word" => Ok(TokenizerKind::UnicodeWord),
            "ngram" => Ok(TokenizerKind::Ngram),
            _ => Err(Error::invalid_arg(
                "name",
                format!("Unrecognized tokenizer: {name}"),
            )),
        }
    }
}

impl TokenizerKind {
    pub const fn name(&self) -> &'static str {
        match self {
            TokenizerKind::Trivial => "trivial",
            TokenizerKind::UnicodeWord => "unicode-word",
            TokenizerKind::Ngram => "ngram",
        }
    }
}

/// Tokenizer settings, as read from the search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    pub kind: TokenizerKind,
    pub max_term_length: usize,
    pub min_term_length: usize,
    /// Lowercase tokens before lookup. The n-gram tokenizer always lowercases.
    pub lowercase: bool,
    pub gram_length: usize,
    /// Pad n-gram input with `#` before and `$` after.
    pub pre_post_padding: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            kind: TokenizerKind::default(),
            max_term_length: DEFAULT_MAX_TERM_LENGTH,
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            lowercase: false,
            gram_length: DEFAULT_GRAM_LENGTH,
            pre_post_padding: true,
        }
    }
}

impl TokenizerConfig {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(max_term_length, self.max_term_length > 0);
        verify_arg!(min_term_length, self.min_term_length <= self.max_term_length);
        verify_arg!(gram_length, self.gram_length > 0);
        Ok(())
    }

    pub fn build(&self) -> Result<TokenizerType> {
        self.validate()?;
        Ok(match self.kind {
            TokenizerKind::Trivial => TokenizerType::Trivial(TrivialTokenizer::with_lengths(
                self.max_term_length,
                self.min_term_length,
            )),
            TokenizerKind::UnicodeWord => TokenizerType::UnicodeWord(
                UnicodeWordTokenizer::with_lengths(self.max_term_length, self.min_term_length)
                    .with_lowercase(self.lowercase),
            ),
            TokenizerKind::Ngram => TokenizerType::Ngram(NGramTokenizer::new(
                self.gram_length,
                self.pre_post_padding,
            )?),
        })
    }
}

/// Runtime choice among the available tokenizers.
pub enum TokenizerType {
    Trivial(TrivialTokenizer),
    UnicodeWord(UnicodeWordTokenizer),
    Ngram(NGramTokenizer),
}

impl Tokenizer for TokenizerType {
    type TokenIter<'a> = Box<dyn Iterator<Item = Cow<'a, str>> + 'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        match self {
            TokenizerType::Trivial(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::UnicodeWord(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::Ngram(tokenizer) => Box::new(tokenizer.tokenize(input)),
        }
    }

    fn kind(&self) -> TokenizerKind {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.kind(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.kind(),
            TokenizerType::Ngram(tokenizer) => tokenizer.kind(),
        }
    }
}
