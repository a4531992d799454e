//! Fixed-size tuple layouts and views.
//!
//! Postings entries and result tuples are both packed records whose field offsets are
//! known statically from a list of field types. Integer fields are stored big-endian,
//! so unsigned fields compare correctly as raw bytes.

use tocc_common::{Result, error::Error, verify_arg};

/// Type of a single fixed-width field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    /// Opaque bytes of the given width, ordered lexicographically.
    Binary(usize),
}

impl FieldType {
    pub const fn size(&self) -> usize {
        match self {
            FieldType::Int32 | FieldType::UInt32 => 4,
            FieldType::Int64 | FieldType::UInt64 => 8,
            FieldType::Binary(len) => *len,
        }
    }
}

/// Field types and offsets of a fixed-size tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleLayout {
    fields: Vec<FieldType>,
    offsets: Vec<usize>,
    size: usize,
}

impl TupleLayout {
    pub fn new(fields: Vec<FieldType>) -> Result<TupleLayout> {
        verify_arg!(fields, !fields.is_empty());
        verify_arg!(fields, fields.iter().all(|f| f.size() > 0));
        let mut offsets = Vec::with_capacity(fields.len());
        let mut size = 0;
        for field in &fields {
            offsets.push(size);
            size += field.size();
        }
        Ok(TupleLayout {
            fields,
            offsets,
            size,
        })
    }

    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    pub fn field_type(&self, index: usize) -> FieldType {
        self.fields[index]
    }

    /// Total width of the tuple in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Layout made of the first `field_count` fields.
    pub fn prefix(&self, field_count: usize) -> Result<TupleLayout> {
        if field_count == 0 || field_count > self.fields.len() {
            return Err(Error::invalid_arg(
                "field_count",
                format!(
                    "{field_count} is not in [1, {}]",
                    self.fields.len()
                ),
            ));
        }
        TupleLayout::new(self.fields[..field_count].to_vec())
    }
}

/// Borrowed view over one tuple's bytes.
#[derive(Clone, Copy)]
pub struct FixedSizeTupleRef<'a> {
    layout: &'a TupleLayout,
    data: &'a [u8],
}

impl<'a> FixedSizeTupleRef<'a> {
    /// Creates a view over `data`, which must hold at least `layout.size()` bytes.
    pub fn new(layout: &'a TupleLayout, data: &'a [u8]) -> FixedSizeTupleRef<'a> {
        debug_assert!(data.len() >= layout.size());
        FixedSizeTupleRef {
            layout,
            data: &data[..layout.size()],
        }
    }

    pub fn layout(&self) -> &'a TupleLayout {
        self.layout
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn field(&self, index: usize) -> &'a [u8] {
        let start = self.layout.field_offset(index);
        &self.data[start..start + self.layout.field_type(index).size()]
    }

    pub fn get_i32(&self, index: usize) -> i32 {
        i32::from_be_bytes(fixed(self.field(index)))
    }

    pub fn get_u32(&self, index: usize) -> u32 {
        u32::from_be_bytes(fixed(self.field(index)))
    }

    pub fn get_i64(&self, index: usize) -> i64 {
        i64::from_be_bytes(fixed(self.field(index)))
    }

    pub fn get_u64(&self, index: usize) -> u64 {
        u64::from_be_bytes(fixed(self.field(index)))
    }
}

impl std::fmt::Debug for FixedSizeTupleRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for (i, field) in self.layout.fields().iter().enumerate() {
            match field {
                FieldType::Int32 => list.entry(&self.get_i32(i)),
                FieldType::UInt32 => list.entry(&self.get_u32(i)),
                FieldType::Int64 => list.entry(&self.get_i64(i)),
                FieldType::UInt64 => list.entry(&self.get_u64(i)),
                FieldType::Binary(_) => list.entry(&self.field(i)),
            };
        }
        list.finish()
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&bytes[..N]);
    buf
}

/// Encodes tuples field by field according to a layout.
pub struct TupleBuilder<'a> {
    layout: &'a TupleLayout,
    buf: Vec<u8>,
    field: usize,
}

impl<'a> TupleBuilder<'a> {
    pub fn new(layout: &'a TupleLayout) -> TupleBuilder<'a> {
        TupleBuilder {
            layout,
            buf: Vec::with_capacity(layout.size()),
            field: 0,
        }
    }

    pub fn push_i32(self, value: i32) -> Result<Self> {
        self.push(FieldType::Int32, &value.to_be_bytes())
    }

    pub fn push_u32(self, value: u32) -> Result<Self> {
        self.push(FieldType::UInt32, &value.to_be_bytes())
    }

    pub fn push_i64(self, value: i64) -> Result<Self> {
        self.push(FieldType::Int64, &value.to_be_bytes())
    }

    pub fn push_u64(self, value: u64) -> Result<Self> {
        self.push(FieldType::UInt64, &value.to_be_bytes())
    }

    pub fn push_binary(self, value: &[u8]) -> Result<Self> {
        self.push(FieldType::Binary(value.len()), value)
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        verify_arg!(field_count, self.field == self.layout.field_count());
        Ok(self.buf)
    }

    fn push(mut self, ty: FieldType, bytes: &[u8]) -> Result<Self> {
        if self.field >= self.layout.field_count() || self.layout.field_type(self.field) != ty {
            return Err(Error::invalid_arg(
                "field",
                format!("{ty:?} does not match field {} of {:?}", self.field, self.layout),
            ));
        }
        self.buf.extend_from_slice(bytes);
        self.field += 1;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let layout = TupleLayout::new(vec![
            FieldType::Int32,
            FieldType::Binary(3),
            FieldType::UInt64,
        ])
        .unwrap();
        assert_eq!(layout.size(), 15);
        assert_eq!(layout.field_offset(1), 4);
        assert_eq!(layout.field_offset(2), 7);

        let key = layout.prefix(1).unwrap();
        assert_eq!(key.size(), 4);
        let head = layout.prefix(2).unwrap();
        assert_eq!(head.size(), 7);
        assert_eq!(head.field_type(1), FieldType::Binary(3));

        assert!(layout.prefix(0).is_err());
        assert!(layout.prefix(4).is_err());
        assert!(TupleLayout::new(vec![]).is_err());
        assert!(TupleLayout::new(vec![FieldType::Binary(0)]).is_err());
    }

    #[test]
    fn test_build_and_read() {
        let layout = TupleLayout::new(vec![
            FieldType::Int32,
            FieldType::UInt32,
            FieldType::Int64,
            FieldType::Binary(2),
        ])
        .unwrap();
        let bytes = TupleBuilder::new(&layout)
            .push_i32(-7)
            .and_then(|b| b.push_u32(9))
            .and_then(|b| b.push_i64(1 << 40))
            .and_then(|b| b.push_binary(b"ab"))
            .and_then(|b| b.finish())
            .unwrap();
        let tuple = FixedSizeTupleRef::new(&layout, &bytes);
        assert_eq!(tuple.get_i32(0), -7);
        assert_eq!(tuple.get_u32(1), 9);
        assert_eq!(tuple.get_i64(2), 1 << 40);
        assert_eq!(tuple.field(3), b"ab");

        assert!(TupleBuilder::new(&layout).push_u32(1).is_err());
        assert!(TupleBuilder::new(&layout).push_i32(1).unwrap().finish().is_err());
    }
}
