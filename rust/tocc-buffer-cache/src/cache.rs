use std::sync::{
    Arc,
    atomic::{AtomicU32, AtomicU64, Ordering},
};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use tocc_common::{Result, error::Error};
use tocc_io::{ReadAt, utils::read_at_zero_padded};

use crate::{
    options::BufferCacheOptions,
    page::{CachedPage, DiskPageId, FileId},
    stats::{CacheCounters, CacheStats},
};

/// Page cache contract consumed by the inverted-list cursors.
///
/// Every successful [`pin`](BufferCache::pin) must be paired with exactly one
/// [`unpin`](BufferCache::unpin) of the returned handle. Implementations must be
/// safe to share between threads; each query thread pins and unpins its own pages.
pub trait BufferCache: Send + Sync + 'static {
    /// Size in bytes of every page served by this cache.
    fn page_size(&self) -> usize;

    /// Pins the page, loading it from its file if it is not resident.
    ///
    /// With `create == true` a page that does not exist in the file is served as a
    /// zero-filled buffer instead of failing with a page-not-found error.
    fn pin(&self, id: DiskPageId, create: bool) -> Result<Arc<CachedPage>>;

    /// Releases one pin on the page.
    fn unpin(&self, page: Arc<CachedPage>) -> Result<()>;
}

impl<T> BufferCache for Arc<T>
where
    T: BufferCache + ?Sized,
{
    fn page_size(&self) -> usize {
        self.as_ref().page_size()
    }

    fn pin(&self, id: DiskPageId, create: bool) -> Result<Arc<CachedPage>> {
        self.as_ref().pin(id, create)
    }

    fn unpin(&self, page: Arc<CachedPage>) -> Result<()> {
        self.as_ref().unpin(page)
    }
}

/// A fixed-capacity page cache over files registered through [`open_file`].
///
/// Page loads happen under the cache mutex, so concurrent misses are serialized;
/// hits and unpins only touch per-page atomics after the lookup.
///
/// [`open_file`]: PagedBufferCache::open_file
pub struct PagedBufferCache {
    options: BufferCacheOptions,
    files: RwLock<AHashMap<FileId, Arc<dyn ReadAt>>>,
    next_file_id: AtomicU32,
    pages: Mutex<AHashMap<DiskPageId, Arc<CachedPage>>>,
    clock: AtomicU64,
    counters: CacheCounters,
}

impl PagedBufferCache {
    pub fn new(options: BufferCacheOptions) -> Result<PagedBufferCache> {
        options.validate()?;
        Ok(PagedBufferCache {
            options,
            files: Default::default(),
            next_file_id: AtomicU32::new(0),
            pages: Default::default(),
            clock: AtomicU64::new(0),
            counters: Default::default(),
        })
    }

    pub fn options(&self) -> &BufferCacheOptions {
        &self.options
    }

    /// Registers a file and returns the identifier used to address its pages.
    pub fn open_file(&self, reader: Arc<dyn ReadAt>) -> FileId {
        let file_id = self.next_file_id.fetch_add(1, Ordering::Relaxed);
        self.files.write().insert(file_id, reader);
        log::debug!("opened file {file_id}");
        file_id
    }

    /// Unregisters a file and drops its resident pages.
    ///
    /// Fails if any page of the file is still pinned.
    pub fn close_file(&self, file_id: FileId) -> Result<()> {
        let mut pages = self.pages.lock();
        if pages
            .iter()
            .any(|(id, page)| id.file_id == file_id && page.is_pinned())
        {
            return Err(Error::invalid_operation(format!(
                "close_file({file_id}) with pinned pages"
            )));
        }
        pages.retain(|id, _| id.file_id != file_id);
        if self.files.write().remove(&file_id).is_none() {
            return Err(Error::invalid_arg(
                "file_id",
                format!("file {file_id} is not open"),
            ));
        }
        log::debug!("closed file {file_id}");
        Ok(())
    }

    /// Returns the number of whole or partial pages of a registered file.
    pub fn num_pages(&self, file_id: FileId) -> Result<u32> {
        let size = self
            .file(file_id)?
            .size()
            .map_err(|e| Error::io(format!("size of file {file_id}"), e))?;
        let page_size = self.options.page_size as u64;
        Ok(size.div_ceil(page_size) as u32)
    }

    pub fn stats(&self) -> CacheStats {
        let pages = self.pages.lock();
        let pinned = pages.values().filter(|page| page.is_pinned()).count();
        self.counters.snapshot(pages.len(), pinned)
    }

    fn file(&self, file_id: FileId) -> Result<Arc<dyn ReadAt>> {
        self.files.read().get(&file_id).cloned().ok_or_else(|| {
            Error::invalid_arg("file_id", format!("file {file_id} is not open"))
        })
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn load_page(&self, id: DiskPageId, create: bool) -> Result<Box<[u8]>> {
        let page_size = self.options.page_size;
        let mut data = vec![0u8; page_size].into_boxed_slice();
        let reader = self.file(id.file_id)?;
        let pos = id.page_id as u64 * page_size as u64;
        let read = read_at_zero_padded(&reader, pos, &mut data)
            .map_err(|e| Error::io(format!("read page {id:?}"), e))?;
        if read == 0 && !create {
            return Err(Error::page_not_found(id.file_id, id.page_id));
        }
        Ok(data)
    }

    /// Drops the least recently used unpinned page. Returns `false` if every
    /// resident page is pinned.
    fn evict_one(&self, pages: &mut AHashMap<DiskPageId, Arc<CachedPage>>) -> bool {
        let victim = pages
            .iter()
            .filter(|(_, page)| !page.is_pinned())
            .min_by_key(|(_, page)| page.last_access())
            .map(|(&id, _)| id);
        match victim {
            Some(id) => {
                pages.remove(&id);
                CacheCounters::bump(&self.counters.evictions);
                log::trace!("evicted page {id:?}");
                true
            }
            None => false,
        }
    }
}

impl BufferCache for PagedBufferCache {
    fn page_size(&self) -> usize {
        self.options.page_size
    }

    fn pin(&self, id: DiskPageId, create: bool) -> Result<Arc<CachedPage>> {
        let mut pages = self.pages.lock();
        if let Some(page) = pages.get(&id) {
            page.pin(self.tick());
            CacheCounters::bump(&self.counters.hits);
            log::trace!("pin {id:?} (hit)");
            return Ok(Arc::clone(page));
        }

        CacheCounters::bump(&self.counters.misses);
        let data = self.load_page(id, create)?;
        if pages.len() >= self.options.capacity && !self.evict_one(&mut pages) {
            CacheCounters::bump(&self.counters.overflows);
            log::warn!(
                "all {} resident pages are pinned, admitting {id:?} above capacity",
                pages.len()
            );
        }

        let page = Arc::new(CachedPage::new(id, data, self.tick()));
        page.pin(self.tick());
        pages.insert(id, Arc::clone(&page));
        log::trace!("pin {id:?} (miss)");
        Ok(page)
    }

    fn unpin(&self, page: Arc<CachedPage>) -> Result<()> {
        if !page.unpin() {
            return Err(Error::invalid_operation(format!(
                "unpin of page {:?} that is not pinned",
                page.disk_page_id()
            )));
        }
        log::trace!("unpin {:?}", page.disk_page_id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tocc_common::error::ErrorKind;

    use super::*;

    fn cache_with_file(capacity: usize, num_pages: usize) -> (PagedBufferCache, FileId) {
        let cache = PagedBufferCache::new(BufferCacheOptions {
            page_size: 64,
            capacity,
        })
        .unwrap();
        let content: Vec<u8> = (0..num_pages * 64).map(|i| (i / 64) as u8).collect();
        let file_id = cache.open_file(Arc::new(content));
        (cache, file_id)
    }

    #[test]
    fn test_pin_reads_page_content() {
        let (cache, file_id) = cache_with_file(4, 3);
        for page_id in 0..3 {
            let page = cache.pin(DiskPageId::new(file_id, page_id), false).unwrap();
            let latch = page.acquire_read_latch();
            assert_eq!(latch.len(), 64);
            assert!(latch.iter().all(|&b| b == page_id as u8));
            latch.release();
            cache.unpin(page).unwrap();
        }
        assert_eq!(cache.num_pages(file_id).unwrap(), 3);
    }

    #[test]
    fn test_missing_page() {
        let (cache, file_id) = cache_with_file(4, 2);
        let err = cache.pin(DiskPageId::new(file_id, 2), false).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::PageNotFound { page_id: 2, .. }));

        let page = cache.pin(DiskPageId::new(file_id, 2), true).unwrap();
        assert!(page.acquire_read_latch().iter().all(|&b| b == 0));
        {
            let mut latch = page.acquire_write_latch();
            latch[0] = 42;
        }
        assert_eq!(page.acquire_read_latch()[0], 42);
        cache.unpin(page).unwrap();
    }

    #[test]
    fn test_double_unpin_is_rejected() {
        let (cache, file_id) = cache_with_file(4, 1);
        let page = cache.pin(DiskPageId::new(file_id, 0), false).unwrap();
        cache.unpin(Arc::clone(&page)).unwrap();
        let err = cache.unpin(page).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    }

    #[test]
    fn test_lru_eviction_skips_pinned_pages() {
        let (cache, file_id) = cache_with_file(2, 4);
        let p0 = cache.pin(DiskPageId::new(file_id, 0), false).unwrap();
        let p1 = cache.pin(DiskPageId::new(file_id, 1), false).unwrap();
        cache.unpin(p1).unwrap();

        // Page 1 is the only unpinned page, so it goes first.
        let p2 = cache.pin(DiskPageId::new(file_id, 2), false).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.resident_pages, 2);
        assert_eq!(stats.pinned_pages, 2);

        // Everything is pinned now: the next page overflows the capacity.
        let p3 = cache.pin(DiskPageId::new(file_id, 3), false).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.overflows, 1);
        assert_eq!(stats.resident_pages, 3);

        for page in [p0, p2, p3] {
            cache.unpin(page).unwrap();
        }
        assert_eq!(cache.stats().pinned_pages, 0);
    }

    #[test]
    fn test_hits_and_misses() {
        let (cache, file_id) = cache_with_file(8, 2);
        let a = cache.pin(DiskPageId::new(file_id, 0), false).unwrap();
        let b = cache.pin(DiskPageId::new(file_id, 0), false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.pin_count(), 2);
        cache.unpin(a).unwrap();
        cache.unpin(b).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_close_file() {
        let (cache, file_id) = cache_with_file(8, 2);
        let page = cache.pin(DiskPageId::new(file_id, 0), false).unwrap();
        assert!(cache.close_file(file_id).is_err());
        cache.unpin(page).unwrap();
        cache.close_file(file_id).unwrap();
        assert_eq!(cache.stats().resident_pages, 0);
        assert!(cache.pin(DiskPageId::new(file_id, 0), false).is_err());
    }

    #[test]
    fn test_file_backed_partial_last_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &[7u8; 100]).unwrap();
        let reader = tocc_io::FileReader::open(file.path()).unwrap();

        let cache = PagedBufferCache::new(BufferCacheOptions {
            page_size: 64,
            capacity: 4,
        })
        .unwrap();
        let file_id = cache.open_file(Arc::new(reader));
        assert_eq!(cache.num_pages(file_id).unwrap(), 2);

        let page = cache.pin(DiskPageId::new(file_id, 1), false).unwrap();
        {
            let latch = page.acquire_read_latch();
            assert!(latch[..36].iter().all(|&b| b == 7));
            assert!(latch[36..].iter().all(|&b| b == 0));
        }
        cache.unpin(page).unwrap();
        assert!(cache.pin(DiskPageId::new(file_id, 2), false).is_err());
    }
}
