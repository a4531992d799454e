//! T-occurrence search: which records contain at least `T` of the query tokens.
//!
//! The query is tokenized and one postings cursor is opened per token. Cursors are
//! processed from the shortest list to the longest. The first `num_prefix_lists`
//! lists are merged into a candidate set by full union. Each remaining list is then
//! merged by probing or scanning, and candidates that can no longer reach the
//! threshold with the lists still to come are dropped.
//!
//! A qualifying record must occur in one of the prefix lists (this is the contract
//! of the [`SearchModifier`]), so the suffix phase only ever updates or drops
//! candidates and never inserts new ones.

use std::sync::Arc;

use serde::Deserialize;
use tocc_common::{Result, error::Error, verify_arg};

use crate::{
    comparator::TupleComparator,
    cursor::{InvertedListCursor, PinnedList},
    inverted_index::InvertedIndex,
    search_cursor::SearchResultCursor,
    search_modifier::SearchModifier,
    search_result::{ResultPair, SearchResult},
    strategy::MergeStrategy,
    tokenizers::Tokenizer,
};

/// Searcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearcherOptions {
    /// Size of each result frame in bytes.
    pub frame_size: usize,
    /// Number of cursors created up front. The pool grows when a query has more tokens.
    pub cursor_cache_size: usize,
    /// Forces one suffix merge strategy instead of choosing per list.
    pub merge_strategy: Option<MergeStrategy>,
}

impl SearcherOptions {
    pub const DEFAULT_FRAME_SIZE: usize = 32 * 1024;
    pub const DEFAULT_CURSOR_CACHE_SIZE: usize = 10;

    pub fn validate(&self) -> Result<()> {
        verify_arg!(frame_size, self.frame_size >= 16);
        verify_arg!(frame_size, self.frame_size <= u32::MAX as usize);
        Ok(())
    }
}

impl Default for SearcherOptions {
    fn default() -> Self {
        SearcherOptions {
            frame_size: Self::DEFAULT_FRAME_SIZE,
            cursor_cache_size: Self::DEFAULT_CURSOR_CACHE_SIZE,
            merge_strategy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearcherState {
    Idle,
    TokenizingQuery,
    CursorsOpened,
    MergingPrefix,
    MergingSuffix,
    ResultReady,
}

/// Runs T-occurrence queries against one index. Serves one query at a time; run
/// concurrent queries on separate searchers sharing the index.
pub struct TOccurrenceSearcher<I: InvertedIndex> {
    index: I,
    options: SearcherOptions,
    state: SearcherState,
    cursor_cache: Vec<I::Cursor>,
    /// Cursor slots of the current query, shortest list first.
    cursor_order: Vec<usize>,
    query_tokens: Vec<Vec<u8>>,
    num_query_tokens: usize,
    results: ResultPair,
    occurrence_threshold: i64,
}

impl<I: InvertedIndex> TOccurrenceSearcher<I> {
    pub fn new(index: I, options: SearcherOptions) -> Result<Self> {
        options.validate()?;
        let key_layout = Arc::new(
            index
                .element_layout()
                .prefix(index.key_field_count())?,
        );
        let results = ResultPair::new(key_layout, options.frame_size)?;
        let cursor_cache = (0..options.cursor_cache_size)
            .map(|_| index.create_inverted_list_cursor())
            .collect();
        Ok(TOccurrenceSearcher {
            index,
            options,
            state: SearcherState::Idle,
            cursor_cache,
            cursor_order: Vec::new(),
            query_tokens: Vec::new(),
            num_query_tokens: 0,
            results,
            occurrence_threshold: 0,
        })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn options(&self) -> &SearcherOptions {
        &self.options
    }

    pub fn state(&self) -> SearcherState {
        self.state
    }

    /// Drops the previous query's results and returns to [`SearcherState::Idle`].
    pub fn reset(&mut self) {
        self.results.clear();
        self.num_query_tokens = 0;
        self.occurrence_threshold = 0;
        self.state = SearcherState::Idle;
    }

    /// Runs a query and returns a cursor over the records that reach the threshold.
    ///
    /// Fails with an occurrence-threshold error when the modifier yields a
    /// threshold `<= 0` for the query's token count.
    pub fn search<T: Tokenizer>(
        &mut self,
        query: &str,
        tokenizer: &T,
        modifier: &dyn SearchModifier,
    ) -> Result<SearchResultCursor<'_>> {
        self.reset();
        if let Err(e) = self.run_query(query, tokenizer, modifier) {
            self.state = SearcherState::Idle;
            return Err(e);
        }
        Ok(self.result_cursor())
    }

    /// Cursor over the results of the last completed query.
    pub fn result_cursor(&self) -> SearchResultCursor<'_> {
        let threshold = if self.state == SearcherState::ResultReady {
            self.occurrence_threshold
        } else {
            // Nothing to report outside of a completed query.
            i64::MAX
        };
        SearchResultCursor::new(self.results.new_result(), threshold)
    }

    pub fn occurrence_threshold(&self) -> i64 {
        self.occurrence_threshold
    }

    pub fn num_query_tokens(&self) -> usize {
        self.num_query_tokens
    }

    /// Frames of the final candidate set, including candidates below the threshold.
    pub fn result_buffers(&self) -> &[Box<[u8]>] {
        self.results.new_result().buffers()
    }

    pub fn num_valid_result_buffers(&self) -> usize {
        self.results.new_result().num_valid_buffers()
    }

    /// The final candidate set, including candidates below the threshold.
    pub fn search_result(&self) -> &SearchResult {
        self.results.new_result()
    }

    fn run_query<T: Tokenizer>(
        &mut self,
        query: &str,
        tokenizer: &T,
        modifier: &dyn SearchModifier,
    ) -> Result<()> {
        self.state = SearcherState::TokenizingQuery;
        self.tokenize_query(query, tokenizer);
        let num_tokens = self.num_query_tokens;

        self.open_cursors()?;
        self.state = SearcherState::CursorsOpened;

        let threshold = modifier.occurrence_threshold(num_tokens);
        if threshold <= 0 {
            return Err(Error::occurrence_threshold(threshold, num_tokens));
        }
        self.occurrence_threshold = threshold;
        let num_prefix_lists = modifier
            .num_prefix_lists(num_tokens)
            .clamp(0, num_tokens as i64) as usize;
        log::debug!(
            "query with {num_tokens} tokens: threshold {threshold}, {num_prefix_lists} prefix lists"
        );

        self.state = SearcherState::MergingPrefix;
        self.merge_prefix_lists(num_prefix_lists)?;
        self.state = SearcherState::MergingSuffix;
        self.merge_suffix_lists(num_prefix_lists)?;
        self.state = SearcherState::ResultReady;
        log::debug!(
            "query produced {} candidates",
            self.results.new_result().num_results()
        );
        Ok(())
    }

    fn tokenize_query<T: Tokenizer>(&mut self, query: &str, tokenizer: &T) {
        let mut count = 0;
        for token in tokenizer.tokenize(query) {
            if count == self.query_tokens.len() {
                self.query_tokens.push(Vec::new());
            }
            let buf = &mut self.query_tokens[count];
            buf.clear();
            buf.extend_from_slice(token.as_bytes());
            count += 1;
        }
        self.num_query_tokens = count;
    }

    fn open_cursors(&mut self) -> Result<()> {
        let num_tokens = self.num_query_tokens;
        while self.cursor_cache.len() < num_tokens {
            self.cursor_cache
                .push(self.index.create_inverted_list_cursor());
        }
        for (cursor, token) in self
            .cursor_cache
            .iter_mut()
            .zip(&self.query_tokens[..num_tokens])
        {
            self.index.open_inverted_list_cursor(cursor, token)?;
        }
        let cursors = &self.cursor_cache;
        self.cursor_order.clear();
        self.cursor_order.extend(0..num_tokens);
        self.cursor_order
            .sort_unstable_by_key(|&slot| cursors[slot].size());
        Ok(())
    }

    fn merge_prefix_lists(&mut self, num_prefix_lists: usize) -> Result<()> {
        let cmp = self.index.comparator();
        for &slot in &self.cursor_order[..num_prefix_lists] {
            self.results.swap();
            let (prev, new) = self.results.split();
            new.clear();
            let mut list = PinnedList::pin(&mut self.cursor_cache[slot])?;
            merge_prefix_list(&mut *list, cmp, prev, new)?;
            list.release()?;
        }
        Ok(())
    }

    fn merge_suffix_lists(&mut self, num_prefix_lists: usize) -> Result<()> {
        let cmp = self.index.comparator();
        let num_tokens = self.num_query_tokens;
        for (list_index, &slot) in self
            .cursor_order
            .iter()
            .enumerate()
            .skip(num_prefix_lists)
        {
            self.results.swap();
            let (prev, new) = self.results.split();
            new.clear();
            let mut list = PinnedList::pin(&mut self.cursor_cache[slot])?;
            let strategy = self
                .options
                .merge_strategy
                .unwrap_or_else(|| MergeStrategy::choose(prev.num_results(), list.size()));
            log::debug!(
                "suffix list {list_index}: {:?} merge of {} candidates with {} entries",
                strategy,
                prev.num_results(),
                list.size()
            );
            let pruning = Pruning {
                threshold: self.occurrence_threshold,
                remaining_lists: (num_tokens - list_index) as i64,
            };
            match strategy {
                MergeStrategy::Probe => merge_suffix_list_probe(&mut *list, cmp, prev, new, pruning)?,
                MergeStrategy::Scan => merge_suffix_list_scan(&mut *list, cmp, prev, new, pruning)?,
            }
            list.release()?;
        }
        Ok(())
    }
}

/// Decides whether a candidate missing from the current suffix list survives.
#[derive(Debug, Clone, Copy)]
struct Pruning {
    threshold: i64,
    /// Lists not merged yet, the current one included.
    remaining_lists: i64,
}

impl Pruning {
    fn keeps(&self, count: u32) -> bool {
        count as i64 + self.remaining_lists > self.threshold
    }
}

fn advance<C: InvertedListCursor + ?Sized>(cursor: &mut C) -> Result<bool> {
    if cursor.has_next() {
        cursor.next()?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Union of the candidates with one list: matches gain one occurrence, list-only
/// keys enter with a count of one, and the rest carry over unchanged.
fn merge_prefix_list<C: InvertedListCursor + ?Sized>(
    cursor: &mut C,
    cmp: &dyn TupleComparator,
    prev: &SearchResult,
    new: &mut SearchResult,
) -> Result<()> {
    let mut candidates = prev.iter();
    let mut candidate = candidates.next();
    let mut in_list = advance(cursor)?;

    while let (true, Some(res)) = (in_list, candidate) {
        let entry = cursor.tuple()?.as_bytes();
        match cmp.compare(entry, res.key()) {
            std::cmp::Ordering::Equal => {
                new.append(res.key(), res.count() + 1)?;
                candidate = candidates.next();
                in_list = advance(cursor)?;
            }
            std::cmp::Ordering::Less => {
                new.append(entry, 1)?;
                in_list = advance(cursor)?;
            }
            std::cmp::Ordering::Greater => {
                new.append(res.key(), res.count())?;
                candidate = candidates.next();
            }
        }
    }

    while in_list {
        new.append(cursor.tuple()?.as_bytes(), 1)?;
        in_list = advance(cursor)?;
    }
    while let Some(res) = candidate {
        new.append(res.key(), res.count())?;
        candidate = candidates.next();
    }
    Ok(())
}

/// Looks every candidate up in the list by binary search.
fn merge_suffix_list_probe<C: InvertedListCursor + ?Sized>(
    cursor: &mut C,
    cmp: &dyn TupleComparator,
    prev: &SearchResult,
    new: &mut SearchResult,
    pruning: Pruning,
) -> Result<()> {
    for res in prev.iter() {
        if cursor.contains_key(res.key(), cmp)? {
            new.append(res.key(), res.count() + 1)?;
        } else if pruning.keeps(res.count()) {
            new.append(res.key(), res.count())?;
        }
    }
    Ok(())
}

/// Walks the candidates and the list side by side.
fn merge_suffix_list_scan<C: InvertedListCursor + ?Sized>(
    cursor: &mut C,
    cmp: &dyn TupleComparator,
    prev: &SearchResult,
    new: &mut SearchResult,
    pruning: Pruning,
) -> Result<()> {
    let mut candidates = prev.iter();
    let mut candidate = candidates.next();
    let mut in_list = advance(cursor)?;

    while let (true, Some(res)) = (in_list, candidate) {
        let entry = cursor.tuple()?.as_bytes();
        match cmp.compare(entry, res.key()) {
            std::cmp::Ordering::Equal => {
                new.append(res.key(), res.count() + 1)?;
                candidate = candidates.next();
                in_list = advance(cursor)?;
            }
            std::cmp::Ordering::Less => {
                in_list = advance(cursor)?;
            }
            std::cmp::Ordering::Greater => {
                if pruning.keeps(res.count()) {
                    new.append(res.key(), res.count())?;
                }
                candidate = candidates.next();
            }
        }
    }

    while let Some(res) = candidate {
        if pruning.keeps(res.count()) {
            new.append(res.key(), res.count())?;
        }
        candidate = candidates.next();
    }
    Ok(())
}
