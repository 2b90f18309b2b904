//! Append-only pagination.
//!
//! List sections grow by appending pages; items are never reordered or
//! removed until an explicit reset. Pages can overlap when the underlying
//! list shifted between requests, so items are deduplicated by key. The next
//! request offset is always the accumulated count, which keeps paging
//! consistent even after overlap was dropped.

use std::collections::HashSet;

/// Accumulates pages of `T` for one list section.
#[derive(Debug)]
pub struct PaginatedAccumulator<T> {
    items: Vec<T>,
    seen: HashSet<String>,
    total: Option<u32>,
}

impl<T> PaginatedAccumulator<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            total: None,
        }
    }

    /// Append a page, dropping items whose key was already accumulated.
    ///
    /// Items for which `key` returns `None` cannot be deduplicated and are
    /// always appended (playlist entries whose track was removed from the
    /// catalog have no id).
    pub fn append_page<F>(&mut self, page_items: Vec<T>, total: u32, key: F)
    where
        F: Fn(&T) -> Option<String>,
    {
        self.total = Some(total);
        for item in page_items {
            match key(&item) {
                Some(k) => {
                    if self.seen.insert(k) {
                        self.items.push(item);
                    }
                }
                None => self.items.push(item),
            }
        }
    }

    /// Accumulated items, in append order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Offset for the next page request: always the accumulated count.
    pub fn next_offset(&self) -> u32 {
        self.items.len() as u32
    }

    /// Whether more items remain server-side.
    ///
    /// True until the first page reports a total.
    pub fn has_more(&self) -> bool {
        match self.total {
            Some(total) => (self.items.len() as u32) < total,
            None => true,
        }
    }

    /// Drop everything and start over.
    pub fn reset(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.total = None;
    }
}

impl<T> Default for PaginatedAccumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(acc: &PaginatedAccumulator<u32>) -> Vec<u32> {
        acc.items().to_vec()
    }

    fn key(n: &u32) -> Option<String> {
        Some(n.to_string())
    }

    #[test]
    fn test_fresh_accumulator_allows_first_load() {
        let acc: PaginatedAccumulator<u32> = PaginatedAccumulator::new();
        assert!(acc.has_more());
        assert_eq!(acc.next_offset(), 0);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_overlapping_pages_are_deduplicated() {
        let mut acc = PaginatedAccumulator::new();
        acc.append_page(vec![1, 2, 3], 5, key);
        acc.append_page(vec![3, 4, 5], 5, key);

        assert_eq!(ids(&acc), vec![1, 2, 3, 4, 5]);
        assert!(!acc.has_more());
    }

    #[test]
    fn test_next_offset_is_accumulated_count() {
        let mut acc = PaginatedAccumulator::new();
        acc.append_page(vec![1, 2, 3], 10, key);
        assert_eq!(acc.next_offset(), 3);

        // Overlap dropped, offset reflects what was kept
        acc.append_page(vec![3, 4], 10, key);
        assert_eq!(acc.next_offset(), 4);
    }

    #[test]
    fn test_has_more_tracks_reported_total() {
        let mut acc = PaginatedAccumulator::new();
        acc.append_page(vec![1, 2], 3, key);
        assert!(acc.has_more());

        acc.append_page(vec![3], 3, key);
        assert!(!acc.has_more());
    }

    #[test]
    fn test_keyless_items_always_append() {
        let mut acc = PaginatedAccumulator::new();
        acc.append_page(vec![0, 0], 4, |_| None);
        acc.append_page(vec![0, 0], 4, |_| None);
        assert_eq!(acc.len(), 4);
    }

    #[test]
    fn test_reset_clears_items_and_dedup_state() {
        let mut acc = PaginatedAccumulator::new();
        acc.append_page(vec![1, 2], 2, key);
        acc.reset();

        assert!(acc.is_empty());
        assert!(acc.has_more());

        // Previously-seen keys are accepted again after reset
        acc.append_page(vec![1, 2], 2, key);
        assert_eq!(acc.len(), 2);
    }
}
