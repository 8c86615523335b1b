use serde::Serialize;
use std::cmp::Ordering;

use crate::models::Transaction;

/// Newest first: `date` descending, then `id` descending.
fn newest_first(a: &&Transaction, b: &&Transaction) -> Ordering {
    b.date.cmp(&a.date).then(b.id.cmp(&a.id))
}

/// The `limit` most recent transactions of a snapshot.
///
/// Nothing is ordered until the view is iterated, and every call to
/// [`RecentView::iter`] starts over from the beginning.
#[derive(Debug, Clone, Copy)]
pub struct RecentView<'a> {
    transactions: &'a [Transaction],
    limit: usize,
}

pub fn recent(transactions: &[Transaction], limit: usize) -> RecentView<'_> {
    RecentView {
        transactions,
        limit,
    }
}

impl<'a> RecentView<'a> {
    fn len(&self) -> usize {
        self.transactions.len().min(self.limit)
    }

    pub fn iter(&self) -> std::vec::IntoIter<&'a Transaction> {
        let mut refs: Vec<&'a Transaction> = self.transactions.iter().collect();
        let n = self.len();
        if n < refs.len() {
            // Only the first `n` need a full sort.
            refs.select_nth_unstable_by(n, newest_first);
            refs.truncate(n);
        }
        refs.sort_by(newest_first);
        refs.into_iter()
    }

    pub fn to_vec(&self) -> Vec<Transaction> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &RecentView<'a> {
    type Item = &'a Transaction;
    type IntoIter = std::vec::IntoIter<&'a Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One page of a listing plus the metadata needed to navigate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// One-based page number.
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    /// `ceil(total / page_size)`.
    pub page_count: usize,
}

/// Slices an already-ordered listing into page `page` (one-based).
///
/// A page past the end is empty but still reports the totals.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let page_count = if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    };
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let slice = items
        .get(start..)
        .map(|rest| &rest[..rest.len().min(page_size)])
        .unwrap_or(&[]);

    Page {
        items: slice.to_vec(),
        page,
        page_size,
        total,
        page_count,
    }
}
