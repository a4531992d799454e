use std::sync::Arc;

use crate::{
    search_result::{ResultTuple, SearchResult, SearchResultIter},
    tuple::TupleLayout,
};

/// Iterates the `(key, count)` results of a query that reach its occurrence threshold.
pub struct SearchResultCursor<'a> {
    inner: SearchResultIter<'a>,
    key_layout: &'a Arc<TupleLayout>,
    occurrence_threshold: i64,
}

impl<'a> SearchResultCursor<'a> {
    pub fn new(result: &'a SearchResult, occurrence_threshold: i64) -> SearchResultCursor<'a> {
        SearchResultCursor {
            inner: result.iter(),
            key_layout: result.key_layout(),
            occurrence_threshold,
        }
    }

    pub fn occurrence_threshold(&self) -> i64 {
        self.occurrence_threshold
    }

    pub fn key_layout(&self) -> &'a Arc<TupleLayout> {
        self.key_layout
    }
}

impl<'a> Iterator for SearchResultCursor<'a> {
    type Item = ResultTuple<'a>;

    fn next(&mut self) -> Option<ResultTuple<'a>> {
        let threshold = self.occurrence_threshold;
        self.inner
            .by_ref()
            .find(|tuple| tuple.count() as i64 >= threshold)
    }
}
