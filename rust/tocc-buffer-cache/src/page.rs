//! Cached page handles and their latches.

use std::{
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicU32, AtomicU64, Ordering},
    },
};

use parking_lot::{
    RawRwLock, RwLock,
    lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard},
};

/// Identifier of a file registered with the cache.
pub type FileId = u32;

/// Zero-based page number within a file.
pub type PageId = u32;

/// Globally unique page address: the owning file and the page number within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiskPageId {
    pub file_id: FileId,
    pub page_id: PageId,
}

impl DiskPageId {
    pub const fn new(file_id: FileId, page_id: PageId) -> DiskPageId {
        DiskPageId { file_id, page_id }
    }
}

/// A page resident in the cache.
///
/// The byte buffer is guarded by a reader-writer latch. Latches are owned guards,
/// so a cursor can hold one across calls for as long as it keeps the page pinned.
pub struct CachedPage {
    id: DiskPageId,
    data: Arc<RwLock<Box<[u8]>>>,
    pin_count: AtomicU32,
    last_access: AtomicU64,
}

impl CachedPage {
    pub(crate) fn new(id: DiskPageId, data: Box<[u8]>, tick: u64) -> CachedPage {
        CachedPage {
            id,
            data: Arc::new(RwLock::new(data)),
            pin_count: AtomicU32::new(0),
            last_access: AtomicU64::new(tick),
        }
    }

    pub fn disk_page_id(&self) -> DiskPageId {
        self.id
    }

    /// Acquires a shared latch over the page buffer. The latch is released when
    /// the returned guard is dropped (or [`PageReadLatch::release`]d).
    pub fn acquire_read_latch(&self) -> PageReadLatch {
        PageReadLatch(self.data.read_arc())
    }

    /// Acquires an exclusive latch over the page buffer.
    pub fn acquire_write_latch(&self) -> PageWriteLatch {
        PageWriteLatch(self.data.write_arc())
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    pub(crate) fn pin(&self, tick: u64) {
        self.pin_count.fetch_add(1, Ordering::AcqRel);
        self.last_access.store(tick, Ordering::Relaxed);
    }

    /// Decrements the pin count; returns `false` if the page was not pinned.
    pub(crate) fn unpin(&self) -> bool {
        self.pin_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .is_ok()
    }

    pub(crate) fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for CachedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPage")
            .field("id", &self.id)
            .field("pin_count", &self.pin_count())
            .finish()
    }
}

/// Shared latch over a page buffer.
pub struct PageReadLatch(ArcRwLockReadGuard<RawRwLock, Box<[u8]>>);

impl PageReadLatch {
    pub fn release(self) {}
}

impl Deref for PageReadLatch {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Exclusive latch over a page buffer.
pub struct PageWriteLatch(ArcRwLockWriteGuard<RawRwLock, Box<[u8]>>);

impl PageWriteLatch {
    pub fn release(self) {}
}

impl Deref for PageWriteLatch {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for PageWriteLatch {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
