//! Token filter over a snapshot.

use crate::query::SearchQuery;
use dirview_indexer::Snapshot;
use dirview_protocol::FileRecord;

/// Lazily filter `snapshot` by `query`.
///
/// The returned iterator borrows both arguments and touches no shared state,
/// so it can be cloned or rebuilt to replay the exact same sequence.
#[must_use]
pub fn search<'a>(snapshot: &'a Snapshot, query: &'a SearchQuery) -> SearchHits<'a> {
    SearchHits {
        records: snapshot.records().iter(),
        query,
    }
}

/// Iterator over the records matching a [`SearchQuery`], in snapshot order.
#[derive(Clone)]
pub struct SearchHits<'a> {
    records: std::slice::Iter<'a, FileRecord>,
    query: &'a SearchQuery,
}

impl<'a> Iterator for SearchHits<'a> {
    type Item = &'a FileRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let query = self.query;
        self.records.by_ref().find(|record| query.matches(&record.path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.records.size_hint().1)
    }
}
