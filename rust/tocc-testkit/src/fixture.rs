//! Index fixtures over `u32` record keys.

use std::{collections::BTreeMap, io::Write, sync::Arc};

use tocc_buffer_cache::{BufferCacheOptions, PagedBufferCache};
use tocc_inverted_index::{
    FieldType, OnDiskInvertedIndex, ResultTuple, SearcherOptions, TOccurrenceSearcher,
    TokenDictionary, TupleBuilder, TupleLayout,
};
use tocc_io::{FileReader, ReadAt};

use crate::PostingsBuilder;

pub type U32Index = OnDiskInvertedIndex<PagedBufferCache>;

/// Postings of `(key: u32, payload: u32)` entries keyed on the first field.
///
/// The payload is derived from the key so that tests can check that whole entries
/// were read back.
pub struct IndexFixture {
    pub cache: Arc<PagedBufferCache>,
    pub index: Arc<U32Index>,
    pub lists: BTreeMap<String, Vec<u32>>,
    _file: Option<tempfile::NamedTempFile>,
}

impl IndexFixture {
    pub const DEFAULT_PAGE_SIZE: usize = 64;

    pub fn entry_layout() -> anyhow::Result<Arc<TupleLayout>> {
        Ok(Arc::new(TupleLayout::new(vec![
            FieldType::UInt32,
            FieldType::UInt32,
        ])?))
    }

    pub fn payload(key: u32) -> u32 {
        key.wrapping_mul(2_654_435_761)
    }

    /// Builds an index backed by an in-memory image.
    pub fn in_memory(
        lists: BTreeMap<String, Vec<u32>>,
        options: BufferCacheOptions,
    ) -> anyhow::Result<IndexFixture> {
        let (image, dictionary) = build_image(&lists, options.page_size)?;
        Self::with_reader(lists, options, Arc::new(image), dictionary, None)
    }

    /// Builds an index backed by a temporary file read through [`FileReader`].
    pub fn on_disk(
        lists: BTreeMap<String, Vec<u32>>,
        options: BufferCacheOptions,
    ) -> anyhow::Result<IndexFixture> {
        let (image, dictionary) = build_image(&lists, options.page_size)?;
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&image)?;
        file.flush()?;
        let reader = FileReader::open(file.path())?;
        Self::with_reader(lists, options, Arc::new(reader), dictionary, Some(file))
    }

    /// Small pages and a cache large enough to hold all of them.
    pub fn small(lists: BTreeMap<String, Vec<u32>>) -> anyhow::Result<IndexFixture> {
        Self::in_memory(
            lists,
            BufferCacheOptions {
                page_size: Self::DEFAULT_PAGE_SIZE,
                capacity: 256,
            },
        )
    }

    pub fn searcher(
        &self,
        options: SearcherOptions,
    ) -> anyhow::Result<TOccurrenceSearcher<Arc<U32Index>>> {
        Ok(TOccurrenceSearcher::new(self.index.clone(), options)?)
    }

    fn with_reader(
        lists: BTreeMap<String, Vec<u32>>,
        options: BufferCacheOptions,
        reader: Arc<dyn ReadAt>,
        dictionary: TokenDictionary,
        file: Option<tempfile::NamedTempFile>,
    ) -> anyhow::Result<IndexFixture> {
        let cache = Arc::new(PagedBufferCache::new(options)?);
        let file_id = cache.open_file(reader);
        let index = OnDiskInvertedIndex::new(
            cache.clone(),
            file_id,
            Self::entry_layout()?,
            1,
            dictionary,
        )?;
        Ok(IndexFixture {
            cache,
            index: Arc::new(index),
            lists,
            _file: file,
        })
    }
}

fn build_image(
    lists: &BTreeMap<String, Vec<u32>>,
    page_size: usize,
) -> anyhow::Result<(Vec<u8>, TokenDictionary)> {
    let layout = IndexFixture::entry_layout()?;
    let mut builder = PostingsBuilder::new(layout.clone(), page_size)?;
    for (i, (token, keys)) in lists.iter().enumerate() {
        let mut keys = keys.clone();
        keys.sort_unstable();
        keys.dedup();
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            entries.push(
                TupleBuilder::new(&layout)
                    .push_u32(key)?
                    .push_u32(IndexFixture::payload(key))?
                    .finish()?,
            );
        }
        builder.push_list(token.as_str(), entries)?;
        // Vary where lists start within a page.
        builder.pad((i % 3) * 4);
    }
    Ok(builder.finish())
}

/// Decodes `(key, count)` pairs of results keyed on a single `u32`.
pub fn decode_results<'a>(
    results: impl IntoIterator<Item = ResultTuple<'a>>,
) -> Vec<(u32, u32)> {
    results
        .into_iter()
        .map(|t| {
            let mut key = [0u8; 4];
            key.copy_from_slice(t.key());
            (u32::from_be_bytes(key), t.count())
        })
        .collect()
}
