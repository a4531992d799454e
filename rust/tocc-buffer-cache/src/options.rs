use serde::Deserialize;
use tocc_common::{Result, verify_arg};

/// Page cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferCacheOptions {
    /// Size of every page in bytes.
    pub page_size: usize,
    /// Number of pages kept resident before unpinned pages start being evicted.
    pub capacity: usize,
}

impl BufferCacheOptions {
    pub const DEFAULT_PAGE_SIZE: usize = 32 * 1024;
    pub const DEFAULT_CAPACITY: usize = 1024;
    pub const MIN_PAGE_SIZE: usize = 64;

    pub fn validate(&self) -> Result<()> {
        verify_arg!(page_size, self.page_size >= Self::MIN_PAGE_SIZE);
        verify_arg!(page_size, self.page_size <= u32::MAX as usize);
        verify_arg!(capacity, self.capacity > 0);
        Ok(())
    }
}

impl Default for BufferCacheOptions {
    fn default() -> Self {
        BufferCacheOptions {
            page_size: Self::DEFAULT_PAGE_SIZE,
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}
