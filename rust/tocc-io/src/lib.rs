//! Positional I/O abstractions used by the page cache:
//! - `ReadAt`: positional reader able to fill a buffer from an arbitrary offset of a
//!   file or blob.
//!
//! Provides a couple of simple implementations: memory-based and file-based.

use std::sync::Arc;

pub mod file;
pub mod memory;
pub mod utils;

pub use file::FileReader;

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads bytes starting at `pos` into `buf`, returning the number of bytes read.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-file
    /// is encountered. A `pos` at or beyond the end of the object yields `Ok(0)`.
    ///
    /// # Arguments
    ///
    /// * `pos` - The position of the first byte to read.
    /// * `buf` - The destination buffer. Its length is the requested read size.
    fn read_at(&self, pos: u64, buf: &mut [u8]) -> std::io::Result<usize>;
}

impl<T> ReadAt for Arc<T>
where
    T: ReadAt + ?Sized,
{
    fn size(&self) -> std::io::Result<u64> {
        self.as_ref().size()
    }

    fn read_at(&self, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        self.as_ref().read_at(pos, buf)
    }
}
