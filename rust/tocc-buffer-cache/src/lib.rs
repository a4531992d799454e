//! Page cache serving fixed-size pages of registered files.
//!
//! The cache is the only component shared between concurrently running queries.
//! Callers [`pin`](BufferCache::pin) a page to keep it resident, take a read latch
//! on its buffer while they inspect it, and [`unpin`](BufferCache::unpin) it exactly
//! once when they are done. Pinned pages are never evicted; unpinned pages are
//! evicted in least-recently-used order once the configured capacity is reached.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tocc_buffer_cache::{BufferCache, BufferCacheOptions, DiskPageId, PagedBufferCache};
//!
//! let cache = PagedBufferCache::new(BufferCacheOptions {
//!     page_size: 64,
//!     capacity: 16,
//! })
//! .unwrap();
//! let file_id = cache.open_file(Arc::new(vec![1u8; 128]));
//!
//! let page = cache.pin(DiskPageId::new(file_id, 1), false).unwrap();
//! {
//!     let latch = page.acquire_read_latch();
//!     assert_eq!(latch[0], 1);
//! }
//! cache.unpin(page).unwrap();
//! ```

mod cache;
mod options;
mod page;
mod stats;

pub use cache::{BufferCache, PagedBufferCache};
pub use options::BufferCacheOptions;
pub use page::{CachedPage, DiskPageId, FileId, PageId, PageReadLatch, PageWriteLatch};
pub use stats::CacheStats;
