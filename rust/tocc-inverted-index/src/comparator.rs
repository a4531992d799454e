use std::cmp::Ordering;

use tocc_common::{Result, error::Error};

use crate::tuple::{FieldType, TupleLayout};

/// Total order over the key prefix of fixed-size tuples.
///
/// Both arguments start at the first byte of a tuple. Postings entries and result
/// tuples share the key prefix layout, so the same comparator serves both.
pub trait TupleComparator: Send + Sync {
    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering;
}

/// Compares the key fields one after another, each by its type.
#[derive(Debug, Clone)]
pub struct FieldwiseComparator {
    fields: Vec<(FieldType, usize)>,
}

impl FieldwiseComparator {
    pub fn new(layout: &TupleLayout, key_field_count: usize) -> Result<FieldwiseComparator> {
        if key_field_count == 0 || key_field_count > layout.field_count() {
            return Err(Error::invalid_arg(
                "key_field_count",
                format!("{key_field_count} is not in [1, {}]", layout.field_count()),
            ));
        }
        let fields = (0..key_field_count)
            .map(|i| (layout.field_type(i), layout.field_offset(i)))
            .collect();
        Ok(FieldwiseComparator { fields })
    }
}

impl TupleComparator for FieldwiseComparator {
    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        for &(ty, offset) in &self.fields {
            let end = offset + ty.size();
            let (l, r) = (&left[offset..end], &right[offset..end]);
            let ord = match ty {
                FieldType::Int32 => read_i32(l).cmp(&read_i32(r)),
                FieldType::Int64 => read_i64(l).cmp(&read_i64(r)),
                FieldType::UInt32 | FieldType::UInt64 | FieldType::Binary(_) => l.cmp(r),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    i32::from_be_bytes(buf)
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}
