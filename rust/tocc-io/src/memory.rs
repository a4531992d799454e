use crate::{ReadAt, verify};

impl<T> ReadAt for T
where
    T: details::SliceBytes + Send + Sync + 'static,
{
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        verify!(pos <= usize::MAX as u64);
        let pos = pos as usize;
        let content = self.as_slice();
        if pos >= content.len() {
            return Ok(0);
        }
        let len = std::cmp::min(buf.len(), content.len() - pos);
        buf[..len].copy_from_slice(&content[pos..pos + len]);
        Ok(len)
    }
}

mod details {
    pub trait SliceBytes {
        fn len(&self) -> usize;
        fn as_slice(&self) -> &[u8];
    }

    impl SliceBytes for Vec<u8> {
        fn len(&self) -> usize {
            Vec::len(self)
        }

        fn as_slice(&self) -> &[u8] {
            Vec::as_slice(self)
        }
    }

    impl SliceBytes for &'static [u8] {
        fn len(&self) -> usize {
            <[u8]>::len(self)
        }

        fn as_slice(&self) -> &[u8] {
            self
        }
    }
}
