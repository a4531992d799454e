//! Frame-backed accumulator of `(key, occurrence count)` result tuples.
//!
//! Each frame is a fixed-size buffer. Tuples are packed from the start of the frame as
//! the key bytes followed by a big-endian `u32` count, and the last four bytes of the
//! frame hold the number of tuples stored in it (big-endian `u32`).

use std::sync::Arc;

use tocc_common::{Result, error::Error, verify_arg};

use crate::tuple::TupleLayout;

const COUNT_SIZE: usize = 4;
const TRAILER_SIZE: usize = 4;

/// Decodes the tuples of a single result frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameAccessor {
    key_size: usize,
    tuple_size: usize,
}

impl FrameAccessor {
    pub fn new(key_size: usize) -> FrameAccessor {
        FrameAccessor {
            key_size,
            tuple_size: key_size + COUNT_SIZE,
        }
    }

    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    pub fn tuple_count(&self, frame: &[u8]) -> usize {
        read_u32(&frame[frame.len() - TRAILER_SIZE..]) as usize
    }

    pub fn tuple_start_offset(&self, tuple_index: usize) -> usize {
        tuple_index * self.tuple_size
    }

    pub fn tuple<'a>(&self, frame: &'a [u8], tuple_index: usize) -> ResultTuple<'a> {
        let start = self.tuple_start_offset(tuple_index);
        let bytes = &frame[start..start + self.tuple_size];
        ResultTuple {
            bytes,
            key_size: self.key_size,
        }
    }
}

/// One `(key, count)` entry of a result frame.
#[derive(Clone, Copy)]
pub struct ResultTuple<'a> {
    bytes: &'a [u8],
    key_size: usize,
}

impl<'a> ResultTuple<'a> {
    pub fn key(&self) -> &'a [u8] {
        &self.bytes[..self.key_size]
    }

    pub fn count(&self) -> u32 {
        read_u32(&self.bytes[self.key_size..])
    }

    /// The whole tuple, key followed by count.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl std::fmt::Debug for ResultTuple<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultTuple")
            .field("key", &self.key())
            .field("count", &self.count())
            .finish()
    }
}

/// Growable sequence of result frames.
///
/// Frames are never released: [`clear`](Self::clear) keeps them for the next query.
pub struct SearchResult {
    key_layout: Arc<TupleLayout>,
    accessor: FrameAccessor,
    frame_size: usize,
    tuples_per_frame: usize,
    frames: Vec<Box<[u8]>>,
    current_buffer_index: usize,
    num_results: usize,
}

impl SearchResult {
    pub fn new(key_layout: Arc<TupleLayout>, frame_size: usize) -> Result<SearchResult> {
        let accessor = FrameAccessor::new(key_layout.size());
        if frame_size < accessor.tuple_size() + TRAILER_SIZE {
            return Err(Error::invalid_arg(
                "frame_size",
                format!(
                    "{frame_size} bytes cannot hold a {} byte result tuple",
                    accessor.tuple_size()
                ),
            ));
        }
        verify_arg!(frame_size, frame_size <= u32::MAX as usize);
        let tuples_per_frame = (frame_size - TRAILER_SIZE) / accessor.tuple_size();
        Ok(SearchResult {
            key_layout,
            accessor,
            frame_size,
            tuples_per_frame,
            frames: vec![vec![0u8; frame_size].into_boxed_slice()],
            current_buffer_index: 0,
            num_results: 0,
        })
    }

    /// Layout of the key prefix carried by every result tuple.
    pub fn key_layout(&self) -> &Arc<TupleLayout> {
        &self.key_layout
    }

    pub fn accessor(&self) -> FrameAccessor {
        self.accessor
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn clear(&mut self) {
        for frame in &mut self.frames[..=self.current_buffer_index] {
            set_tuple_count(frame, 0);
        }
        self.current_buffer_index = 0;
        self.num_results = 0;
    }

    /// Appends a result tuple. Only the first `key_layout().size()` bytes of `key`
    /// are stored, so `key` may be a whole postings entry or a result tuple.
    ///
    /// Keys must be appended in strictly increasing order.
    pub fn append(&mut self, key: &[u8], count: u32) -> Result<()> {
        let key_size = self.key_layout.size();
        if key.len() < key_size {
            return Err(Error::invalid_arg(
                "key",
                format!("{} bytes, expected at least {key_size}", key.len()),
            ));
        }
        let mut frame_count = self.accessor.tuple_count(&self.frames[self.current_buffer_index]);
        if frame_count == self.tuples_per_frame {
            self.current_buffer_index += 1;
            if self.current_buffer_index == self.frames.len() {
                self.frames
                    .push(vec![0u8; self.frame_size].into_boxed_slice());
            }
            set_tuple_count(&mut self.frames[self.current_buffer_index], 0);
            frame_count = 0;
        }

        let frame = &mut self.frames[self.current_buffer_index];
        let start = self.accessor.tuple_start_offset(frame_count);
        frame[start..start + key_size].copy_from_slice(&key[..key_size]);
        frame[start + key_size..start + key_size + COUNT_SIZE]
            .copy_from_slice(&count.to_be_bytes());
        set_tuple_count(frame, frame_count + 1);
        self.num_results += 1;
        Ok(())
    }

    /// All allocated frames. Only the first
    /// [`current_buffer_index() + 1`](Self::current_buffer_index) are valid.
    pub fn buffers(&self) -> &[Box<[u8]>] {
        &self.frames
    }

    /// Index of the last frame in use.
    pub fn current_buffer_index(&self) -> usize {
        self.current_buffer_index
    }

    pub fn num_valid_buffers(&self) -> usize {
        self.current_buffer_index + 1
    }

    pub fn num_results(&self) -> usize {
        self.num_results
    }

    pub fn is_empty(&self) -> bool {
        self.num_results == 0
    }

    pub fn iter(&self) -> SearchResultIter<'_> {
        SearchResultIter::new(&self.frames[..self.num_valid_buffers()], self.accessor)
    }
}

/// Iterator over the tuples of a run of result frames.
#[derive(Clone)]
pub struct SearchResultIter<'a> {
    frames: &'a [Box<[u8]>],
    accessor: FrameAccessor,
    frame_index: usize,
    tuple_index: usize,
}

impl<'a> SearchResultIter<'a> {
    pub fn new(frames: &'a [Box<[u8]>], accessor: FrameAccessor) -> SearchResultIter<'a> {
        SearchResultIter {
            frames,
            accessor,
            frame_index: 0,
            tuple_index: 0,
        }
    }
}

impl<'a> Iterator for SearchResultIter<'a> {
    type Item = ResultTuple<'a>;

    fn next(&mut self) -> Option<ResultTuple<'a>> {
        let frames = self.frames;
        while let Some(frame) = frames.get(self.frame_index) {
            if self.tuple_index < self.accessor.tuple_count(frame) {
                let tuple = self.accessor.tuple(frame, self.tuple_index);
                self.tuple_index += 1;
                return Some(tuple);
            }
            self.frame_index += 1;
            self.tuple_index = 0;
        }
        None
    }
}

/// The previous and new accumulators of a merge step.
///
/// Roles are tracked by index and flipped with [`swap`](Self::swap); the buffers
/// themselves never move.
pub struct ResultPair {
    results: [SearchResult; 2],
    new_index: usize,
}

impl ResultPair {
    pub fn new(key_layout: Arc<TupleLayout>, frame_size: usize) -> Result<ResultPair> {
        Ok(ResultPair {
            results: [
                SearchResult::new(key_layout.clone(), frame_size)?,
                SearchResult::new(key_layout, frame_size)?,
            ],
            new_index: 0,
        })
    }

    pub fn swap(&mut self) {
        self.new_index ^= 1;
    }

    pub fn clear(&mut self) {
        self.results.iter_mut().for_each(SearchResult::clear);
    }

    pub fn new_result(&self) -> &SearchResult {
        &self.results[self.new_index]
    }

    /// Borrows `(previous, new)` at the same time.
    pub fn split(&mut self) -> (&SearchResult, &mut SearchResult) {
        let [first, second] = &mut self.results;
        if self.new_index == 0 {
            (second, first)
        } else {
            (first, second)
        }
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(buf)
}

fn set_tuple_count(frame: &mut [u8], count: usize) {
    let len = frame.len();
    frame[len - TRAILER_SIZE..].copy_from_slice(&(count as u32).to_be_bytes());
}
