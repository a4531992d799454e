//! Cursors over paged postings lists.
//!
//! A postings list is a run of fixed-size entries spread over a contiguous range of
//! pages. The cursor pins the whole range, walks it sequentially, and supports direct
//! access by element index through a per-page table of cumulative element counts.

use std::{
    cmp::Ordering,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use tocc_buffer_cache::{BufferCache, CachedPage, DiskPageId, FileId, PageReadLatch};
use tocc_common::{Result, error::Error, verify_data};

use crate::{
    comparator::TupleComparator,
    location::InvertedListLocation,
    tuple::{FixedSizeTupleRef, TupleLayout},
};

/// Access to one postings list at a time.
///
/// A cursor is positioned on a list with [`reset`](Self::reset), made readable with
/// [`pin_pages_sync`](Self::pin_pages_sync) and released with
/// [`unpin_pages`](Self::unpin_pages). Every pin must be paired with exactly one
/// unpin; [`PinnedList`] does the pairing on scope exit.
pub trait InvertedListCursor {
    /// Positions the cursor on a new list, "before the first element".
    fn reset(&mut self, location: InvertedListLocation) -> Result<()>;

    /// Pins and read-latches every page of the list.
    fn pin_pages_sync(&mut self) -> Result<()>;

    /// Non-blocking variant of [`pin_pages_sync`](Self::pin_pages_sync). It may only
    /// prefetch; callers still pin synchronously before reading.
    fn pin_pages_async(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases every page pinned by [`pin_pages_sync`](Self::pin_pages_sync).
    fn unpin_pages(&mut self) -> Result<()>;

    fn is_pinned(&self) -> bool;

    fn has_next(&self) -> bool;

    /// Advances to the next element.
    fn next(&mut self) -> Result<()>;

    /// The element the cursor is positioned on.
    fn tuple(&self) -> Result<FixedSizeTupleRef<'_>>;

    /// Positions the cursor on the element with the given index within the list.
    /// A subsequent [`next`](Self::next) continues from the following element.
    fn position_cursor(&mut self, element_index: usize) -> Result<()>;

    /// Binary search for an entry whose key compares equal to `search_key`.
    fn contains_key(&mut self, search_key: &[u8], cmp: &dyn TupleComparator) -> Result<bool>;

    /// Number of elements in the list.
    fn size(&self) -> usize;

    fn location(&self) -> &InvertedListLocation;
}

struct PinnedPage {
    page: Arc<CachedPage>,
    latch: PageReadLatch,
}

/// Cursor over lists of fixed-size elements.
pub struct FixedSizeElementCursor<B: BufferCache + ?Sized> {
    cache: Arc<B>,
    file_id: FileId,
    layout: Arc<TupleLayout>,
    element_size: usize,
    page_size: usize,
    location: InvertedListLocation,
    /// Inclusive index of the last element stored on each page of the list.
    element_indexes: Vec<usize>,
    pages: Vec<PinnedPage>,
    pinned: bool,
    /// Number of elements consumed so far.
    position: usize,
    current_page: usize,
    current_offset: usize,
}

impl<B> FixedSizeElementCursor<B>
where
    B: BufferCache + ?Sized,
{
    pub fn new(cache: Arc<B>, file_id: FileId, layout: Arc<TupleLayout>) -> Self {
        let page_size = cache.page_size();
        let element_size = layout.size();
        FixedSizeElementCursor {
            cache,
            file_id,
            layout,
            element_size,
            page_size,
            location: InvertedListLocation::empty(),
            element_indexes: Vec::new(),
            pages: Vec::new(),
            pinned: false,
            position: 0,
            current_page: 0,
            current_offset: 0,
        }
    }

    pub fn element_layout(&self) -> &Arc<TupleLayout> {
        &self.layout
    }

    /// Index of the element the cursor is positioned on, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    fn num_pages(&self) -> usize {
        self.location.num_pages()
    }

    fn first_page_capacity(&self, start_offset: usize) -> usize {
        self.page_size.saturating_sub(start_offset) / self.element_size
    }

    fn verify_location(&self, location: &InvertedListLocation) -> Result<()> {
        if location.is_empty() {
            return Ok(());
        }
        verify_data!(
            end_page_id,
            location.end_page_id >= location.start_page_id
        );
        let first = self.first_page_capacity(location.start_offset);
        verify_data!(start_offset, first > 0);
        let per_page = self.page_size / self.element_size;
        let num_pages = location.num_pages();
        let capacity = first + (num_pages - 1) * per_page;
        verify_data!(element_count, location.element_count <= capacity);
        if num_pages > 1 {
            // The last page must hold at least one element.
            verify_data!(element_count, location.element_count > capacity - per_page);
        }
        Ok(())
    }

    fn build_element_indexes(&mut self) {
        let num_pages = self.num_pages();
        self.element_indexes.clear();
        if num_pages == 0 {
            return;
        }
        let per_page = self.page_size / self.element_size;
        let mut last = self.first_page_capacity(self.location.start_offset) - 1;
        for _ in 0..num_pages - 1 {
            self.element_indexes.push(last);
            last += per_page;
        }
        self.element_indexes.push(self.location.element_count - 1);
    }

    fn release_pages(&mut self) -> Result<()> {
        let mut first_err = None;
        for PinnedPage { page, latch } in self.pages.drain(..) {
            latch.release();
            if let Err(e) = self.cache.unpin(page) {
                log::warn!("failed to unpin postings page: {e}");
                first_err.get_or_insert(e);
            }
        }
        self.pinned = false;
        first_err.map_or(Ok(()), Err)
    }

    fn verify_pinned(&self, op: &str) -> Result<()> {
        if self.pinned {
            Ok(())
        } else {
            Err(Error::invalid_operation(format!("{op} on unpinned list")))
        }
    }
}

impl<B> InvertedListCursor for FixedSizeElementCursor<B>
where
    B: BufferCache + ?Sized,
{
    fn reset(&mut self, location: InvertedListLocation) -> Result<()> {
        if self.pinned {
            return Err(Error::invalid_operation("reset of a pinned list"));
        }
        self.verify_location(&location)?;
        self.location = location;
        self.position = 0;
        self.current_page = 0;
        self.current_offset = 0;
        self.build_element_indexes();
        Ok(())
    }

    fn pin_pages_sync(&mut self) -> Result<()> {
        if self.pinned {
            return Err(Error::invalid_operation("pin of an already pinned list"));
        }
        let start = self.location.start_page_id;
        let page_ids = (start..=self.location.end_page_id).take(self.num_pages());
        for page_id in page_ids {
            match self.cache.pin(DiskPageId::new(self.file_id, page_id), false) {
                Ok(page) => {
                    let latch = page.acquire_read_latch();
                    self.pages.push(PinnedPage { page, latch });
                }
                Err(e) => {
                    let _ = self.release_pages();
                    return Err(e);
                }
            }
        }
        self.pinned = true;
        log::trace!(
            "pinned {} pages of file {} from page {start}",
            self.pages.len(),
            self.file_id
        );
        Ok(())
    }

    fn unpin_pages(&mut self) -> Result<()> {
        if !self.pinned {
            return Err(Error::invalid_operation("unpin of a list that is not pinned"));
        }
        self.release_pages()
    }

    fn is_pinned(&self) -> bool {
        self.pinned
    }

    fn has_next(&self) -> bool {
        self.position < self.location.element_count
    }

    fn next(&mut self) -> Result<()> {
        self.verify_pinned("next")?;
        if !self.has_next() {
            return Err(Error::index_out_of_bounds(
                self.position,
                self.location.element_count,
            ));
        }
        if self.position == 0 {
            self.current_page = 0;
            self.current_offset = self.location.start_offset;
        } else {
            let offset = self.current_offset + self.element_size;
            if offset + self.element_size > self.page_size {
                self.current_page += 1;
                self.current_offset = 0;
            } else {
                self.current_offset = offset;
            }
        }
        self.position += 1;
        Ok(())
    }

    fn tuple(&self) -> Result<FixedSizeTupleRef<'_>> {
        self.verify_pinned("tuple")?;
        if self.position == 0 {
            return Err(Error::invalid_operation("tuple before the first element"));
        }
        let page = &self.pages[self.current_page].latch;
        let start = self.current_offset;
        Ok(FixedSizeTupleRef::new(
            &self.layout,
            &page[start..start + self.element_size],
        ))
    }

    fn position_cursor(&mut self, element_index: usize) -> Result<()> {
        self.verify_pinned("position_cursor")?;
        // Smallest page whose last element index is >= the target.
        let page = self
            .element_indexes
            .partition_point(|&last| last < element_index);
        if element_index >= self.location.element_count || page >= self.element_indexes.len() {
            return Err(Error::index_out_of_bounds(
                element_index,
                self.location.element_count,
            ));
        }
        self.current_offset = if page == 0 {
            self.location.start_offset + element_index * self.element_size
        } else {
            (element_index - self.element_indexes[page - 1] - 1) * self.element_size
        };
        self.current_page = page;
        self.position = element_index + 1;
        Ok(())
    }

    fn contains_key(&mut self, search_key: &[u8], cmp: &dyn TupleComparator) -> Result<bool> {
        let mut begin = 0;
        let mut end = self.location.element_count;
        while begin < end {
            let mid = begin + (end - begin) / 2;
            self.position_cursor(mid)?;
            match cmp.compare(search_key, self.tuple()?.as_bytes()) {
                Ordering::Less => end = mid,
                Ordering::Greater => begin = mid + 1,
                Ordering::Equal => return Ok(true),
            }
        }
        Ok(false)
    }

    fn size(&self) -> usize {
        self.location.element_count
    }

    fn location(&self) -> &InvertedListLocation {
        &self.location
    }
}

impl<B: BufferCache + ?Sized> Drop for FixedSizeElementCursor<B> {
    fn drop(&mut self) {
        if !self.pages.is_empty() {
            log::warn!(
                "postings cursor dropped with {} pinned pages",
                self.pages.len()
            );
            let _ = self.release_pages();
        }
    }
}

/// Scoped pin of a cursor's page range.
///
/// Pins on construction and unpins when dropped, so every exit path releases the
/// pages. Use [`release`](Self::release) to observe the unpin result.
pub struct PinnedList<'c, C: InvertedListCursor + ?Sized> {
    cursor: &'c mut C,
    released: bool,
}

impl<'c, C: InvertedListCursor + ?Sized> PinnedList<'c, C> {
    pub fn pin(cursor: &'c mut C) -> Result<Self> {
        cursor.pin_pages_sync()?;
        Ok(PinnedList {
            cursor,
            released: false,
        })
    }

    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.cursor.unpin_pages()
    }
}

impl<C: InvertedListCursor + ?Sized> Drop for PinnedList<'_, C> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.cursor.unpin_pages() {
                log::warn!("failed to unpin postings list: {e}");
            }
        }
    }
}

impl<C: InvertedListCursor + ?Sized> Deref for PinnedList<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.cursor
    }
}

impl<C: InvertedListCursor + ?Sized> DerefMut for PinnedList<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use tocc_buffer_cache::{BufferCacheOptions, PagedBufferCache};
    use tocc_common::error::ErrorKind;

    use super::*;
    use crate::{
        comparator::FieldwiseComparator,
        tuple::FieldType,
    };

    const PAGE_SIZE: usize = 64;

    fn layout() -> Arc<TupleLayout> {
        Arc::new(TupleLayout::new(vec![FieldType::UInt32, FieldType::UInt32]).unwrap())
    }

    /// Lays out `keys` as (key, key * 10) entries starting at `start_offset` of page 1.
    fn setup(keys: &[u32], start_offset: usize) -> (Arc<PagedBufferCache>, FileId, InvertedListLocation) {
        let cache = Arc::new(
            PagedBufferCache::new(BufferCacheOptions {
                page_size: PAGE_SIZE,
                capacity: 8,
            })
            .unwrap(),
        );
        let mut image = vec![0xffu8; PAGE_SIZE + start_offset];
        let mut page = 1u32;
        let mut offset = start_offset;
        for &key in keys {
            if offset + 8 > PAGE_SIZE {
                image.resize(image.len() + PAGE_SIZE - offset, 0xff);
                page += 1;
                offset = 0;
            }
            image.extend_from_slice(&key.to_be_bytes());
            image.extend_from_slice(&(key * 10).to_be_bytes());
            offset += 8;
        }
        let file_id = cache.open_file(Arc::new(image));
        let location = InvertedListLocation {
            start_page_id: 1,
            end_page_id: page,
            start_offset,
            element_count: keys.len(),
        };
        (cache, file_id, location)
    }

    fn key_bytes(key: u32) -> [u8; 4] {
        key.to_be_bytes()
    }

    #[test]
    fn test_sequential_and_positioned_access_agree() {
        let keys: Vec<u32> = (0..40).map(|i| i * 3 + 1).collect();
        for start_offset in [0, 8, 24, 56] {
            let (cache, file_id, location) = setup(&keys, start_offset);
            let mut cursor = FixedSizeElementCursor::new(cache.clone(), file_id, layout());
            cursor.reset(location).unwrap();
            assert_eq!(cursor.size(), keys.len());

            let mut list = PinnedList::pin(&mut cursor).unwrap();
            let mut sequential = Vec::new();
            while list.has_next() {
                list.next().unwrap();
                let tuple = list.tuple().unwrap();
                assert_eq!(tuple.get_u32(1), tuple.get_u32(0) * 10);
                sequential.push(tuple.get_u32(0));
            }
            assert_eq!(sequential, keys);
            assert!(list.next().is_err());

            for (i, &key) in keys.iter().enumerate().rev() {
                list.position_cursor(i).unwrap();
                assert_eq!(list.tuple().unwrap().get_u32(0), key);
                assert_eq!(list.current_index(), Some(i));
            }
            list.release().unwrap();
            assert_eq!(cache.stats().pinned_pages, 0);
        }
    }

    #[test]
    fn test_contains_key_matches_linear_search() {
        let keys: Vec<u32> = (0..25).map(|i| i * 2).collect();
        let (cache, file_id, location) = setup(&keys, 16);
        let cmp = FieldwiseComparator::new(&layout(), 1).unwrap();
        let mut cursor = FixedSizeElementCursor::new(cache, file_id, layout());
        cursor.reset(location).unwrap();
        let mut list = PinnedList::pin(&mut cursor).unwrap();
        for probe in 0..52 {
            let found = list.contains_key(&key_bytes(probe), &cmp).unwrap();
            assert_eq!(found, keys.contains(&probe), "probe {probe}");
        }
    }

    #[test]
    fn test_position_out_of_bounds() {
        let (cache, file_id, location) = setup(&[1, 2, 3], 0);
        let mut cursor = FixedSizeElementCursor::new(cache, file_id, layout());
        cursor.reset(location).unwrap();
        let mut list = PinnedList::pin(&mut cursor).unwrap();
        let err = list.position_cursor(3).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::IndexOutOfBounds { index: 3, len: 3 }
        ));
    }

    #[test]
    fn test_empty_list() {
        let (cache, file_id, _) = setup(&[], 0);
        let cmp = FieldwiseComparator::new(&layout(), 1).unwrap();
        let mut cursor = FixedSizeElementCursor::new(cache.clone(), file_id, layout());
        cursor.reset(InvertedListLocation::empty()).unwrap();
        let mut list = PinnedList::pin(&mut cursor).unwrap();
        assert!(!list.has_next());
        assert!(!list.contains_key(&key_bytes(1), &cmp).unwrap());
        assert!(list.position_cursor(0).is_err());
        list.release().unwrap();
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_pin_lifecycle() {
        let (cache, file_id, location) = setup(&(0..20).collect::<Vec<_>>(), 0);
        let mut cursor = FixedSizeElementCursor::new(cache.clone(), file_id, layout());
        cursor.reset(location).unwrap();
        assert!(cursor.next().is_err());

        cursor.pin_pages_sync().unwrap();
        assert_eq!(cache.stats().pinned_pages, location.num_pages());
        assert!(cursor.pin_pages_sync().is_err());
        assert!(cursor.reset(location).is_err());
        cursor.unpin_pages().unwrap();
        assert!(cursor.unpin_pages().is_err());
        assert_eq!(cache.stats().pinned_pages, 0);

        {
            let _list = PinnedList::pin(&mut cursor).unwrap();
            assert_eq!(cache.stats().pinned_pages, location.num_pages());
        }
        assert_eq!(cache.stats().pinned_pages, 0);
        assert!(!cursor.is_pinned());
    }

    #[test]
    fn test_partial_pin_failure_releases_pages() {
        let (cache, file_id, mut location) = setup(&(0..10).collect::<Vec<_>>(), 0);
        let mut cursor = FixedSizeElementCursor::new(cache.clone(), file_id, layout());
        // Stretch the list over pages that do not exist in the file.
        location.end_page_id += 3;
        location.element_count += 3 * (PAGE_SIZE / 8);
        cursor.reset(location).unwrap();
        let err = cursor.pin_pages_sync().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::PageNotFound { .. }));
        assert!(!cursor.is_pinned());
        assert_eq!(cache.stats().pinned_pages, 0);
    }

    #[test]
    fn test_pin_of_last_page_id() {
        let (cache, file_id, _) = setup(&[1, 2], 0);
        let mut cursor = FixedSizeElementCursor::new(cache.clone(), file_id, layout());
        cursor
            .reset(InvertedListLocation {
                start_page_id: u32::MAX,
                end_page_id: u32::MAX,
                start_offset: 0,
                element_count: 1,
            })
            .unwrap();
        assert_eq!(cursor.location().num_pages(), 1);
        let err = cursor.pin_pages_sync().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::PageNotFound {
                page_id: u32::MAX,
                ..
            }
        ));
        assert!(!cursor.is_pinned());
        assert_eq!(cache.stats().pinned_pages, 0);
    }

    #[test]
    fn test_reset_rejects_bad_locations() {
        let (cache, file_id, location) = setup(&(0..20).collect::<Vec<_>>(), 0);
        let mut cursor = FixedSizeElementCursor::new(cache, file_id, layout());

        let mut bad = location;
        bad.element_count = 100;
        assert!(matches!(
            cursor.reset(bad).unwrap_err().kind(),
            ErrorKind::InvalidFormat { .. }
        ));

        let mut bad = location;
        bad.start_offset = PAGE_SIZE - 4;
        assert!(cursor.reset(bad).is_err());

        let mut bad = location;
        bad.end_page_id += 1;
        assert!(cursor.reset(bad).is_err());

        cursor.reset(location).unwrap();
    }
}
