//! Seeded random corpora.

use std::collections::{BTreeMap, BTreeSet};

/// Shape of a generated corpus.
#[derive(Debug, Clone, Copy)]
pub struct CorpusSpec {
    pub num_records: u32,
    pub vocabulary_size: usize,
    /// Upper bound on distinct tokens per record.
    pub max_tokens_per_record: usize,
}

impl Default for CorpusSpec {
    fn default() -> Self {
        CorpusSpec {
            num_records: 400,
            vocabulary_size: 24,
            max_tokens_per_record: 8,
        }
    }
}

pub fn token_name(i: usize) -> String {
    format!("t{i}")
}

/// Generates the postings lists of a random corpus.
///
/// Token popularity is skewed: token `i` is drawn with probability roughly
/// proportional to `1 / (i + 1)`, so list lengths span a wide range.
pub fn random_lists(rng: &mut fastrand::Rng, spec: CorpusSpec) -> BTreeMap<String, Vec<u32>> {
    let mut lists: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for record in 0..spec.num_records {
        // Leave gaps in the key space.
        let key = record * 3 + rng.u32(0..3);
        let num_tokens = rng.usize(1..=spec.max_tokens_per_record);
        for _ in 0..num_tokens {
            let token = skewed_index(rng, spec.vocabulary_size);
            lists.entry(token_name(token)).or_default().insert(key);
        }
    }
    lists
        .into_iter()
        .map(|(token, keys)| (token, keys.into_iter().collect()))
        .collect()
}

/// Generates a space-separated query of `len` tokens. Tokens may repeat, and some
/// fall outside the vocabulary.
pub fn random_query(rng: &mut fastrand::Rng, spec: CorpusSpec, len: usize) -> String {
    let tokens: Vec<String> = (0..len)
        .map(|_| {
            if rng.u8(0..10) == 0 {
                format!("zz{}", rng.u32(0..100))
            } else {
                token_name(rng.usize(0..spec.vocabulary_size))
            }
        })
        .collect();
    tokens.join(" ")
}

fn skewed_index(rng: &mut fastrand::Rng, n: usize) -> usize {
    let a = rng.usize(0..n);
    let b = rng.usize(0..n);
    a.min(b)
}
