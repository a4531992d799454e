use serde::Deserialize;

/// How a suffix list is merged into the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Binary-search every candidate in the list: `O(n log m)`.
    Probe,
    /// Walk both sorted sequences: `O(n + m)`.
    Scan,
}

impl MergeStrategy {
    /// Picks the cheaper strategy for merging `num_candidates` candidates with a list
    /// of `list_size` entries. Probing wins only when strictly cheaper.
    pub fn choose(num_candidates: usize, list_size: usize) -> MergeStrategy {
        let n = num_candidates as f64;
        let m = list_size as f64;
        if n * m.ln() < n + m {
            MergeStrategy::Probe
        } else {
            MergeStrategy::Scan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose() {
        // Few candidates against a long list.
        assert_eq!(MergeStrategy::choose(3, 100_000), MergeStrategy::Probe);
        // Comparable sizes.
        assert_eq!(MergeStrategy::choose(5_000, 6_000), MergeStrategy::Scan);
        // An empty list costs nothing to probe.
        assert_eq!(MergeStrategy::choose(10, 0), MergeStrategy::Probe);
        assert_eq!(MergeStrategy::choose(0, 0), MergeStrategy::Scan);
        assert_eq!(MergeStrategy::choose(0, 10), MergeStrategy::Probe);
    }

    #[test]
    fn test_scan_band() {
        // With 10 candidates, 10 * ln(m) < 10 + m fails only for m in [5, 19].
        assert_eq!(MergeStrategy::choose(10, 4), MergeStrategy::Probe);
        assert_eq!(MergeStrategy::choose(10, 5), MergeStrategy::Scan);
        assert_eq!(MergeStrategy::choose(10, 19), MergeStrategy::Scan);
        assert_eq!(MergeStrategy::choose(10, 20), MergeStrategy::Probe);
    }
}
