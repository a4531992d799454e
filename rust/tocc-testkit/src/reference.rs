//! Brute-force T-occurrence evaluation.

use std::collections::BTreeMap;

/// Counts, for every key, how many of the query tokens' lists contain it. A token
/// repeated in the query counts once per repetition; a token without a list
/// contributes nothing.
pub fn occurrence_counts<S: AsRef<str>>(
    lists: &BTreeMap<String, Vec<u32>>,
    query_tokens: &[S],
) -> BTreeMap<u32, u32> {
    let mut counts = BTreeMap::new();
    for token in query_tokens {
        let Some(keys) = lists.get(token.as_ref()) else {
            continue;
        };
        let mut keys = keys.clone();
        keys.sort_unstable();
        keys.dedup();
        for key in keys {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// Sorted `(key, count)` pairs with `count >= threshold`.
pub fn t_occurrence<S: AsRef<str>>(
    lists: &BTreeMap<String, Vec<u32>>,
    query_tokens: &[S],
    threshold: i64,
) -> Vec<(u32, u32)> {
    occurrence_counts(lists, query_tokens)
        .into_iter()
        .filter(|&(_, count)| count as i64 >= threshold)
        .collect()
}
