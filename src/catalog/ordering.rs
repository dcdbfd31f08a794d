//! Display ordering for catalog listings.

use crate::models::book::BookRecord;

/// Sort books by case-folded title for display.
///
/// Top-down merge sort. While merging, the left run only wins when its title
/// is strictly smaller, so on equal titles the record from the right half is
/// emitted first. Listings depend on that tie order; do not swap in
/// `sort_by`, which keeps equal elements in input order.
pub fn order_for_display(records: &[BookRecord]) -> Vec<BookRecord> {
    let keyed: Vec<(String, &BookRecord)> = records.iter().map(|b| (b.title_key(), b)).collect();
    merge_sort(keyed).into_iter().map(|(_, b)| b.clone()).collect()
}

fn merge_sort<T>(mut items: Vec<(String, T)>) -> Vec<(String, T)> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    merge(merge_sort(items), merge_sort(right))
}

fn merge<T>(left: Vec<(String, T)>, right: Vec<(String, T)>) -> Vec<(String, T)> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let next = if l.0 < r.0 { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    merged
}
