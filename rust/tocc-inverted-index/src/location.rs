use tocc_buffer_cache::PageId;

/// Placement of one postings list within its file.
///
/// Entries start at `start_offset` of `start_page_id` and run through `end_page_id`
/// (inclusive). Pages between the first and the last are fully packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvertedListLocation {
    pub start_page_id: PageId,
    pub end_page_id: PageId,
    pub start_offset: usize,
    pub element_count: usize,
}

impl InvertedListLocation {
    /// Location of a list with no entries. It spans no pages.
    pub const fn empty() -> InvertedListLocation {
        InvertedListLocation {
            start_page_id: 0,
            end_page_id: 0,
            start_offset: 0,
            element_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    pub fn num_pages(&self) -> usize {
        if self.is_empty() || self.end_page_id < self.start_page_id {
            0
        } else {
            (self.end_page_id - self.start_page_id) as usize + 1
        }
    }
}
