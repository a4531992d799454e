#[macro_export]
macro_rules! verify {
    ($expr:expr) => {{
        let result = $expr;
        $crate::utils::verify(result, stringify!($expr))?;
    }};
}

pub fn verify(predicate: bool, condition: &str) -> std::io::Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            condition,
        ))
    }
}

/// Fills `buf` from `reader` starting at `pos`, zero-filling whatever lies beyond
/// the end of the object. Returns the number of bytes actually read from the object.
pub fn read_at_zero_padded<R: crate::ReadAt + ?Sized>(
    reader: &R,
    pos: u64,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let read = reader.read_at(pos, buf)?;
    buf[read..].fill(0);
    Ok(read)
}
