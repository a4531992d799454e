use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Pins served by an already resident page.
    pub hits: u64,
    /// Pins that had to load (or create) the page.
    pub misses: u64,
    /// Unpinned pages dropped to make room.
    pub evictions: u64,
    /// Pages admitted above capacity because every resident page was pinned.
    pub overflows: u64,
    /// Pages currently resident.
    pub resident_pages: usize,
    /// Resident pages with a non-zero pin count.
    pub pinned_pages: usize,
}

#[derive(Default)]
pub(crate) struct CacheCounters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
    pub overflows: AtomicU64,
}

impl CacheCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, resident_pages: usize, pinned_pages: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            resident_pages,
            pinned_pages,
        }
    }
}
