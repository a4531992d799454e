//! Token to postings-list resolution.

use std::{collections::BTreeMap, sync::Arc};

use tocc_buffer_cache::{BufferCache, FileId};
use tocc_common::{Result, error::Error};

use crate::{
    comparator::{FieldwiseComparator, TupleComparator},
    cursor::{FixedSizeElementCursor, InvertedListCursor},
    location::InvertedListLocation,
    tuple::TupleLayout,
};

/// An index whose postings lists can be opened by token.
pub trait InvertedIndex {
    type Cursor: InvertedListCursor;

    /// Creates an unpositioned cursor. Cursors are pooled by the searcher and
    /// repositioned with [`open_inverted_list_cursor`](Self::open_inverted_list_cursor).
    fn create_inverted_list_cursor(&self) -> Self::Cursor;

    /// Positions `cursor` on the postings list of `token`. A token without postings
    /// leaves the cursor on an empty list.
    fn open_inverted_list_cursor(&self, cursor: &mut Self::Cursor, token: &[u8]) -> Result<()>;

    /// Layout of the postings entries.
    fn element_layout(&self) -> &Arc<TupleLayout>;

    /// Number of leading entry fields that form the key.
    fn key_field_count(&self) -> usize;

    fn comparator(&self) -> &dyn TupleComparator;
}

/// Token bytes to postings list locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDictionary {
    entries: BTreeMap<Vec<u8>, InvertedListLocation>,
}

impl TokenDictionary {
    pub fn new() -> TokenDictionary {
        Default::default()
    }

    pub fn insert(&mut self, token: impl Into<Vec<u8>>, location: InvertedListLocation) {
        self.entries.insert(token.into(), location);
    }

    pub fn get(&self, token: &[u8]) -> Option<&InvertedListLocation> {
        self.entries.get(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &InvertedListLocation)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }
}

/// Postings of fixed-size entries stored in one file served by a page cache.
pub struct OnDiskInvertedIndex<B: BufferCache + ?Sized> {
    cache: Arc<B>,
    file_id: FileId,
    layout: Arc<TupleLayout>,
    key_field_count: usize,
    comparator: FieldwiseComparator,
    dictionary: TokenDictionary,
}

impl<B> OnDiskInvertedIndex<B>
where
    B: BufferCache + ?Sized,
{
    pub fn new(
        cache: Arc<B>,
        file_id: FileId,
        layout: Arc<TupleLayout>,
        key_field_count: usize,
        dictionary: TokenDictionary,
    ) -> Result<Self> {
        let comparator = FieldwiseComparator::new(&layout, key_field_count)?;
        if layout.size() > cache.page_size() {
            return Err(Error::invalid_arg(
                "layout",
                format!(
                    "{} byte entries do not fit {} byte pages",
                    layout.size(),
                    cache.page_size()
                ),
            ));
        }
        Ok(OnDiskInvertedIndex {
            cache,
            file_id,
            layout,
            key_field_count,
            comparator,
            dictionary,
        })
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn dictionary(&self) -> &TokenDictionary {
        &self.dictionary
    }
}

impl<B> InvertedIndex for OnDiskInvertedIndex<B>
where
    B: BufferCache + ?Sized,
{
    type Cursor = FixedSizeElementCursor<B>;

    fn create_inverted_list_cursor(&self) -> FixedSizeElementCursor<B> {
        FixedSizeElementCursor::new(self.cache.clone(), self.file_id, self.layout.clone())
    }

    fn open_inverted_list_cursor(
        &self,
        cursor: &mut FixedSizeElementCursor<B>,
        token: &[u8],
    ) -> Result<()> {
        let location = self
            .dictionary
            .get(token)
            .copied()
            .unwrap_or(InvertedListLocation::empty());
        cursor.reset(location)
    }

    fn element_layout(&self) -> &Arc<TupleLayout> {
        &self.layout
    }

    fn key_field_count(&self) -> usize {
        self.key_field_count
    }

    fn comparator(&self) -> &dyn TupleComparator {
        &self.comparator
    }
}

impl<I> InvertedIndex for Arc<I>
where
    I: InvertedIndex + ?Sized,
{
    type Cursor = I::Cursor;

    fn create_inverted_list_cursor(&self) -> I::Cursor {
        self.as_ref().create_inverted_list_cursor()
    }

    fn open_inverted_list_cursor(&self, cursor: &mut I::Cursor, token: &[u8]) -> Result<()> {
        self.as_ref().open_inverted_list_cursor(cursor, token)
    }

    fn element_layout(&self) -> &Arc<TupleLayout> {
        self.as_ref().element_layout()
    }

    fn key_field_count(&self) -> usize {
        self.as_ref().key_field_count()
    }

    fn comparator(&self) -> &dyn TupleComparator {
        self.as_ref().comparator()
    }
}

#[cfg(test)]
mod tests {
    use tocc_buffer_cache::{BufferCacheOptions, PagedBufferCache};

    use super::*;
    use crate::tuple::FieldType;

    #[test]
    fn test_open_missing_token_gives_empty_list() {
        let cache = Arc::new(
            PagedBufferCache::new(BufferCacheOptions {
                page_size: 64,
                capacity: 4,
            })
            .unwrap(),
        );
        let mut image = Vec::new();
        for key in [3u32, 8, 11] {
            image.extend_from_slice(&key.to_be_bytes());
        }
        let file_id = cache.open_file(Arc::new(image));
        let mut dictionary = TokenDictionary::new();
        dictionary.insert(
            "tok",
            InvertedListLocation {
                start_page_id: 0,
                end_page_id: 0,
                start_offset: 0,
                element_count: 3,
            },
        );
        let layout = Arc::new(TupleLayout::new(vec![FieldType::UInt32]).unwrap());
        let index = OnDiskInvertedIndex::new(cache, file_id, layout, 1, dictionary).unwrap();
        assert_eq!(index.dictionary().len(), 1);

        let mut cursor = index.create_inverted_list_cursor();
        index.open_inverted_list_cursor(&mut cursor, b"tok").unwrap();
        assert_eq!(cursor.size(), 3);
        index.open_inverted_list_cursor(&mut cursor, b"nope").unwrap();
        assert_eq!(cursor.size(), 0);
        assert_eq!(cursor.location(), &InvertedListLocation::empty());
    }

    #[test]
    fn test_entries_must_fit_a_page() {
        let cache = Arc::new(
            PagedBufferCache::new(BufferCacheOptions {
                page_size: 64,
                capacity: 4,
            })
            .unwrap(),
        );
        let file_id = cache.open_file(Arc::new(Vec::<u8>::new()));
        let layout = Arc::new(TupleLayout::new(vec![FieldType::Binary(100)]).unwrap());
        assert!(
            OnDiskInvertedIndex::new(cache, file_id, layout, 1, TokenDictionary::new()).is_err()
        );
    }
}
