//! Search modifiers: the policy that turns a query token count into an occurrence
//! threshold and a number of prefix lists.
//!
//! The searcher relies on `num_prefix_lists(n) >= n - occurrence_threshold(n) + 1`:
//! a record that qualifies must then occur in at least one prefix list. All
//! modifiers here use exactly that bound.

use serde::Deserialize;
use tocc_common::{Result, verify_arg};

pub trait SearchModifier: Send + Sync {
    /// Minimum number of query tokens a record must match.
    fn occurrence_threshold(&self, num_query_tokens: usize) -> i64;

    /// Number of shortest lists merged without pruning.
    fn num_prefix_lists(&self, num_query_tokens: usize) -> i64;

    fn kind(&self) -> SearchModifierKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchModifierKind {
    Conjunctive,
    Jaccard,
    EditDistance,
}

impl SearchModifierKind {
    pub const fn name(&self) -> &'static str {
        match self {
            SearchModifierKind::Conjunctive => "conjunctive",
            SearchModifierKind::Jaccard => "jaccard",
            SearchModifierKind::EditDistance => "edit-distance",
        }
    }
}

/// Every query token must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjunctiveSearchModifier;

impl SearchModifier for ConjunctiveSearchModifier {
    fn occurrence_threshold(&self, num_query_tokens: usize) -> i64 {
        num_query_tokens as i64
    }

    fn num_prefix_lists(&self, _num_query_tokens: usize) -> i64 {
        1
    }

    fn kind(&self) -> SearchModifierKind {
        SearchModifierKind::Conjunctive
    }
}

/// Jaccard similarity: at least `floor(n * threshold)` tokens, and never less than one.
#[derive(Debug, Clone, Copy)]
pub struct JaccardSearchModifier {
    threshold: f32,
}

impl JaccardSearchModifier {
    pub fn new(threshold: f32) -> Result<JaccardSearchModifier> {
        verify_arg!(threshold, threshold > 0.0 && threshold <= 1.0);
        Ok(JaccardSearchModifier { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl SearchModifier for JaccardSearchModifier {
    fn occurrence_threshold(&self, num_query_tokens: usize) -> i64 {
        ((num_query_tokens as f32 * self.threshold).floor() as i64).max(1)
    }

    fn num_prefix_lists(&self, num_query_tokens: usize) -> i64 {
        num_query_tokens as i64 - self.occurrence_threshold(num_query_tokens) + 1
    }

    fn kind(&self) -> SearchModifierKind {
        SearchModifierKind::Jaccard
    }
}

/// Edit distance over q-grams: every edit destroys at most `gram_length` grams, so a
/// string within `edit_distance` edits shares at least `n - edit_distance * gram_length`
/// grams with the query.
#[derive(Debug, Clone, Copy)]
pub struct EditDistanceSearchModifier {
    gram_length: usize,
    edit_distance: usize,
}

impl EditDistanceSearchModifier {
    pub fn new(gram_length: usize, edit_distance: usize) -> Result<EditDistanceSearchModifier> {
        verify_arg!(gram_length, gram_length > 0);
        Ok(EditDistanceSearchModifier {
            gram_length,
            edit_distance,
        })
    }
}

impl SearchModifier for EditDistanceSearchModifier {
    fn occurrence_threshold(&self, num_query_tokens: usize) -> i64 {
        num_query_tokens as i64 - (self.edit_distance * self.gram_length) as i64
    }

    fn num_prefix_lists(&self, num_query_tokens: usize) -> i64 {
        num_query_tokens as i64 - self.occurrence_threshold(num_query_tokens) + 1
    }

    fn kind(&self) -> SearchModifierKind {
        SearchModifierKind::EditDistance
    }
}

/// Serializable choice of search modifier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SearchModifierConfig {
    #[default]
    Conjunctive,
    Jaccard {
        threshold: f32,
    },
    EditDistance {
        gram_length: usize,
        edit_distance: usize,
    },
}

impl SearchModifierConfig {
    pub fn validate(&self) -> Result<()> {
        self.build().map(|_| ())
    }

    pub fn build(&self) -> Result<Box<dyn SearchModifier>> {
        Ok(match *self {
            SearchModifierConfig::Conjunctive => Box::new(ConjunctiveSearchModifier),
            SearchModifierConfig::Jaccard { threshold } => {
                Box::new(JaccardSearchModifier::new(threshold)?)
            }
            SearchModifierConfig::EditDistance {
                gram_length,
                edit_distance,
            } => Box::new(EditDistanceSearchModifier::new(
                gram_length,
                edit_distance,
            )?),
        })
    }
}
