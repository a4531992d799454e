//! T-occurrence search over paged inverted lists.
//!
//! Given a query, the searcher finds every record whose key occurs in at least `T` of
//! the postings lists selected by the query tokens, together with the number of lists
//! it occurs in. The threshold `T` comes from a [`SearchModifier`]: all tokens for a
//! conjunctive query, a fraction of them for Jaccard similarity, or the q-gram count
//! bound for edit-distance search.
//!
//! # Overview
//!
//! - **Postings**: sorted runs of fixed-size [tuples](tuple) stored across a
//!   contiguous range of pages of a file served by a
//!   [page cache](tocc_buffer_cache::BufferCache). A [`TokenDictionary`] maps each
//!   token to the [location](InvertedListLocation) of its list.
//! - **Cursors**: a [`FixedSizeElementCursor`] pins a whole list and walks it
//!   sequentially or by binary search.
//! - **Search**: the [`TOccurrenceSearcher`] merges the shortest lists by full union
//!   and the remaining ones by probing or scanning, pruning candidates that can no
//!   longer reach the threshold.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tocc_buffer_cache::{BufferCacheOptions, PagedBufferCache};
//! use tocc_inverted_index::{
//!     ConjunctiveSearchModifier, FieldType, InvertedListLocation, OnDiskInvertedIndex,
//!     SearcherOptions, TOccurrenceSearcher, TokenDictionary, TupleLayout,
//!     UnicodeWordTokenizer,
//! };
//!
//! let cache = Arc::new(
//!     PagedBufferCache::new(BufferCacheOptions {
//!         page_size: 64,
//!         capacity: 8,
//!     })
//!     .unwrap(),
//! );
//!
//! // "red" on page 0, "fox" on page 1.
//! let mut image = vec![0u8; 128];
//! for (i, key) in [1u32, 4, 7].into_iter().enumerate() {
//!     image[i * 4..i * 4 + 4].copy_from_slice(&key.to_be_bytes());
//! }
//! for (i, key) in [4u32, 9].into_iter().enumerate() {
//!     image[64 + i * 4..64 + i * 4 + 4].copy_from_slice(&key.to_be_bytes());
//! }
//! let file_id = cache.open_file(Arc::new(image));
//!
//! let mut dictionary = TokenDictionary::new();
//! dictionary.insert("red", InvertedListLocation {
//!     start_page_id: 0,
//!     end_page_id: 0,
//!     start_offset: 0,
//!     element_count: 3,
//! });
//! dictionary.insert("fox", InvertedListLocation {
//!     start_page_id: 1,
//!     end_page_id: 1,
//!     start_offset: 0,
//!     element_count: 2,
//! });
//!
//! let layout = Arc::new(TupleLayout::new(vec![FieldType::UInt32]).unwrap());
//! let index = OnDiskInvertedIndex::new(cache, file_id, layout, 1, dictionary).unwrap();
//! let mut searcher = TOccurrenceSearcher::new(index, SearcherOptions::default()).unwrap();
//!
//! let keys: Vec<u32> = searcher
//!     .search("red fox", &UnicodeWordTokenizer::new(), &ConjunctiveSearchModifier)
//!     .unwrap()
//!     .map(|t| u32::from_be_bytes(t.key().try_into().unwrap()))
//!     .collect();
//! assert_eq!(keys, vec![4]);
//! ```

pub mod comparator;
pub mod config;
pub mod cursor;
pub mod inverted_index;
pub mod location;
pub mod search_cursor;
pub mod search_modifier;
pub mod search_result;
pub mod searcher;
pub mod strategy;
pub mod tokenizers;
pub mod tuple;

pub use comparator::{FieldwiseComparator, TupleComparator};
pub use config::SearchConfig;
pub use cursor::{FixedSizeElementCursor, InvertedListCursor, PinnedList};
pub use inverted_index::{InvertedIndex, OnDiskInvertedIndex, TokenDictionary};
pub use location::InvertedListLocation;
pub use search_cursor::SearchResultCursor;
pub use search_modifier::{
    ConjunctiveSearchModifier, EditDistanceSearchModifier, JaccardSearchModifier,
    SearchModifier, SearchModifierConfig, SearchModifierKind,
};
pub use search_result::{FrameAccessor, ResultPair, ResultTuple, SearchResult};
pub use searcher::{SearcherOptions, SearcherState, TOccurrenceSearcher};
pub use strategy::MergeStrategy;
pub use tokenizers::{
    NGramTokenizer, Tokenizer, TokenizerConfig, TokenizerKind, TokenizerType,
    TrivialTokenizer, UnicodeWordTokenizer, create_tokenizer,
};
pub use tuple::{FieldType, FixedSizeTupleRef, TupleBuilder, TupleLayout};
