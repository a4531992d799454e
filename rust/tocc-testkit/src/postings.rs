//! Builds paged postings images.

use std::sync::Arc;

use tocc_inverted_index::{InvertedListLocation, TokenDictionary, TupleLayout};

/// Packs postings lists one after another into a paged file image.
///
/// Entries never straddle a page: an entry that does not fit the rest of the current
/// page starts the next one. Lists are appended where the previous list ended, so
/// most lists start in the middle of a page.
pub struct PostingsBuilder {
    layout: Arc<TupleLayout>,
    page_size: usize,
    image: Vec<u8>,
    dictionary: TokenDictionary,
}

impl PostingsBuilder {
    pub fn new(layout: Arc<TupleLayout>, page_size: usize) -> anyhow::Result<PostingsBuilder> {
        anyhow::ensure!(
            layout.size() <= page_size,
            "{} byte entries do not fit {page_size} byte pages",
            layout.size()
        );
        Ok(PostingsBuilder {
            layout,
            page_size,
            image: Vec::new(),
            dictionary: TokenDictionary::new(),
        })
    }

    pub fn layout(&self) -> &Arc<TupleLayout> {
        &self.layout
    }

    /// Skips `len` bytes, filling them with a marker value.
    pub fn pad(&mut self, len: usize) {
        self.image.resize(self.image.len() + len, 0xee);
    }

    /// Appends a list of encoded entries, which must already be sorted by key.
    /// Empty lists are not added to the dictionary.
    pub fn push_list<E>(
        &mut self,
        token: impl Into<Vec<u8>>,
        entries: impl IntoIterator<Item = E>,
    ) -> anyhow::Result<InvertedListLocation>
    where
        E: AsRef<[u8]>,
    {
        let entry_size = self.layout.size();
        let mut location = InvertedListLocation::empty();
        for entry in entries {
            let entry = entry.as_ref();
            anyhow::ensure!(
                entry.len() == entry_size,
                "entry of {} bytes, expected {entry_size}",
                entry.len()
            );
            let offset = self.image.len() % self.page_size;
            if offset + entry_size > self.page_size {
                self.pad(self.page_size - offset);
            }
            let page_id = (self.image.len() / self.page_size) as u32;
            if location.element_count == 0 {
                location.start_page_id = page_id;
                location.start_offset = self.image.len() % self.page_size;
            }
            location.end_page_id = page_id;
            location.element_count += 1;
            self.image.extend_from_slice(entry);
        }
        if !location.is_empty() {
            self.dictionary.insert(token, location);
        }
        Ok(location)
    }

    /// Returns the file image, zero-padded to whole pages, and its dictionary.
    pub fn finish(mut self) -> (Vec<u8>, TokenDictionary) {
        let tail = self.image.len() % self.page_size;
        if tail != 0 {
            self.image.resize(self.image.len() + self.page_size - tail, 0);
        }
        (self.image, self.dictionary)
    }
}

#[cfg(test)]
mod tests {
    use tocc_inverted_index::FieldType;

    use super::*;

    #[test]
    fn test_lists_are_packed_across_pages() {
        let layout = Arc::new(TupleLayout::new(vec![FieldType::UInt32, FieldType::UInt32]).unwrap());
        let mut builder = PostingsBuilder::new(layout, 64).unwrap();
        let entry = |k: u32| [k.to_be_bytes(), k.to_be_bytes()].concat();

        let first = builder.push_list("a", (0..5).map(entry)).unwrap();
        assert_eq!(first.start_page_id, 0);
        assert_eq!(first.start_offset, 0);
        assert_eq!(first.end_page_id, 0);

        builder.pad(4);
        // 44 bytes used, 2 entries fit the rest of page 0.
        let second = builder.push_list("b", (0..10).map(entry)).unwrap();
        assert_eq!(second.start_page_id, 0);
        assert_eq!(second.start_offset, 44);
        assert_eq!(second.end_page_id, 1);
        assert_eq!(second.element_count, 10);

        let empty = builder.push_list("c", Vec::<Vec<u8>>::new()).unwrap();
        assert!(empty.is_empty());

        let (image, dictionary) = builder.finish();
        assert_eq!(image.len(), 128);
        assert_eq!(dictionary.len(), 2);
        assert!(dictionary.get(b"c").is_none());
    }

    #[test]
    fn test_rejects_wrong_entry_size() {
        let layout = Arc::new(TupleLayout::new(vec![FieldType::UInt32]).unwrap());
        let mut builder = PostingsBuilder::new(layout, 64).unwrap();
        assert!(builder.push_list("x", [[0u8; 3]]).is_err());
        assert!(PostingsBuilder::new(Arc::new(TupleLayout::new(vec![FieldType::Binary(80)]).unwrap()), 64).is_err());
    }
}
