//! Search configuration file.
//!
//! ```toml
//! [cache]
//! page_size = 32768
//! capacity = 1024
//!
//! [searcher]
//! frame_size = 32768
//! cursor_cache_size = 10
//! # merge_strategy = "scan"
//!
//! [tokenizer]
//! kind = "ngram"
//! gram_length = 3
//!
//! [modifier]
//! kind = "edit-distance"
//! gram_length = 3
//! edit_distance = 1
//! ```
//!
//! Every section and field is optional and falls back to its default.

use std::path::Path;

use serde::Deserialize;
use tocc_buffer_cache::BufferCacheOptions;
use tocc_common::{Result, error::Error};

use crate::{
    search_modifier::SearchModifierConfig, searcher::SearcherOptions,
    tokenizers::TokenizerConfig,
};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub cache: BufferCacheOptions,
    pub searcher: SearcherOptions,
    pub tokenizer: TokenizerConfig,
    pub modifier: SearchModifierConfig,
}

impl SearchConfig {
    pub fn from_toml_str(s: &str) -> Result<SearchConfig> {
        let config: SearchConfig =
            toml::from_str(s).map_err(|e| Error::invalid_arg("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SearchConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.searcher.validate()?;
        self.tokenizer.validate()?;
        self.modifier.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        strategy::MergeStrategy,
        tokenizers::{Tokenizer, TokenizerKind},
    };

    #[test]
    fn test_defaults() {
        let config = SearchConfig::from_toml_str("").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.cache.page_size, 32 * 1024);
        assert_eq!(config.cache.capacity, 1024);
        assert_eq!(config.searcher.frame_size, 32 * 1024);
        assert_eq!(config.searcher.cursor_cache_size, 10);
        assert_eq!(config.searcher.merge_strategy, None);
        assert_eq!(config.tokenizer.kind, TokenizerKind::UnicodeWord);
        assert_eq!(config.modifier, SearchModifierConfig::Conjunctive);
    }

    #[test]
    fn test_full_config() {
        let config = SearchConfig::from_toml_str(
            r#"
            [cache]
            page_size = 4096
            capacity = 64

            [searcher]
            frame_size = 1024
            merge_strategy = "scan"

            [tokenizer]
            kind = "ngram"
            gram_length = 2
            pre_post_padding = false

            [modifier]
            kind = "edit-distance"
            gram_length = 2
            edit_distance = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.page_size, 4096);
        assert_eq!(config.searcher.cursor_cache_size, 10);
        assert_eq!(config.searcher.merge_strategy, Some(MergeStrategy::Scan));
        assert_eq!(config.tokenizer.build().unwrap().name(), "ngram");
        assert_eq!(
            config.modifier,
            SearchModifierConfig::EditDistance {
                gram_length: 2,
                edit_distance: 1
            }
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(SearchConfig::from_toml_str("[cache]\npage_size = 8").is_err());
        assert!(SearchConfig::from_toml_str("[searcher]\nframes = 3").is_err());
        assert!(SearchConfig::from_toml_str("[modifier]\nkind = \"cosine\"").is_err());
        assert!(
            SearchConfig::from_toml_str("[modifier]\nkind = \"jaccard\"\nthreshold = 2.0")
                .is_err()
        );
        assert!(SearchConfig::load("/nonexistent/tocc.toml").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.toml");
        std::fs::write(&path, "[modifier]\nkind = \"jaccard\"\nthreshold = 0.5\n").unwrap();
        let config = SearchConfig::load(&path).unwrap();
        assert_eq!(config.modifier, SearchModifierConfig::Jaccard { threshold: 0.5 });
    }
}
