use std::{
    fs::File,
    path::Path,
    sync::{Arc, OnceLock},
};

use crate::ReadAt;

/// Positional reader over a read-only file, typically a postings file served
/// through the page cache.
pub struct FileReader {
    file: Arc<File>,
    size: OnceLock<u64>,
}

impl FileReader {
    pub fn new(file: impl Into<Arc<File>>) -> FileReader {
        FileReader {
            file: file.into(),
            size: Default::default(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileReader> {
        Ok(FileReader::new(File::open(path)?))
    }
}

impl FileReader {
    fn get_size(&self) -> std::io::Result<u64> {
        if let Some(&size) = self.size.get() {
            Ok(size)
        } else {
            let size = self.file.metadata()?.len();
            let _ = self.size.set(size);
            Ok(size)
        }
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> std::io::Result<u64> {
        self.get_size()
    }

    fn read_at(&self, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.get_size()?;
        if pos >= size || buf.is_empty() {
            return Ok(0);
        }
        let len = std::cmp::min(buf.len() as u64, size - pos) as usize;
        file_read_at_exact(&self.file, pos, &mut buf[..len])?;
        Ok(len)
    }
}

#[cfg(unix)]
pub fn file_read_at_exact(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, pos)?;
    Ok(())
}

#[cfg(windows)]
pub fn file_read_at_exact(file: &File, mut pos: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, pos) {
            Ok(0) => break,
            Ok(n) => {
                buf = &mut buf[n..];
                pos += n as u64;
            }
            Err(e) => return Err(e),
        }
    }
    if !buf.is_empty() {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{ReadAt, file::FileReader};

    #[test]
    fn test_file_reader() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("postings.bin");
        let content: Vec<u8> = (0..80).map(|i| b"abcdefgh"[i % 8]).collect();
        std::fs::write(&path, &content).expect("write");

        let reader = FileReader::open(&path).expect("open file");
        assert_eq!(reader.size().unwrap(), 80);
        for pos in (0..80).step_by(8) {
            let mut buf = [0u8; 4];
            assert_eq!(reader.read_at(pos, &mut buf).expect("read_at"), 4);
            assert_eq!(&buf, b"abcd");
        }

        let mut buf = [0u8; 16];
        assert_eq!(reader.read_at(76, &mut buf).expect("read_at"), 4);
        assert_eq!(&buf[..4], b"efgh");
        assert_eq!(reader.read_at(80, &mut buf).expect("read_at"), 0);
    }
}
