//! Page cursor over the filtered row set

use std::ops::Range;

use super::error::TableError;

/// Page sizes offered by the rows-per-page selector
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Position shown in the table footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    /// 1-based index of the first row on the page
    pub first_row: usize,
    /// 1-based index of the last row on the page
    pub last_row: usize,
    pub total: usize,
}

/// 0-based page cursor. Navigation clamps to `[0, page_count - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_index: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Result<Self, TableError> {
        validate_page_size(page_size)?;
        Ok(Self {
            page_index: 0,
            page_size,
        })
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, total: usize) -> usize {
        (total + self.page_size - 1) / self.page_size
    }

    fn last_index(&self, total: usize) -> usize {
        self.page_count(total).saturating_sub(1)
    }

    /// Pull the page index back inside range after the row count shrank
    pub fn clamp(&mut self, total: usize) {
        self.page_index = self.page_index.min(self.last_index(total));
    }

    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self, total: usize) -> bool {
        self.page_index < self.last_index(total)
    }

    pub fn first(&mut self) {
        self.page_index = 0;
    }

    pub fn previous(&mut self) {
        if self.can_previous() {
            self.page_index -= 1;
        }
    }

    pub fn next(&mut self, total: usize) {
        if self.can_next(total) {
            self.page_index += 1;
        }
    }

    pub fn last(&mut self, total: usize) {
        self.page_index = self.last_index(total);
    }

    /// Change the page size, keeping the first visible row on screen
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TableError> {
        validate_page_size(page_size)?;
        let top_row = self.page_index * self.page_size;
        self.page_size = page_size;
        self.page_index = top_row / page_size;
        Ok(())
    }

    /// Step to the next (or previous) size in [`PAGE_SIZE_OPTIONS`], wrapping around
    pub fn cycle_page_size(&mut self, forward: bool) {
        let pos = PAGE_SIZE_OPTIONS
            .iter()
            .position(|s| *s == self.page_size)
            .unwrap_or(0);
        let len = PAGE_SIZE_OPTIONS.len();
        let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
        let top_row = self.page_index * self.page_size;
        self.page_size = PAGE_SIZE_OPTIONS[next];
        self.page_index = top_row / self.page_size;
    }

    /// Index range of the current page within `total` rows
    pub fn page_range(&self, total: usize) -> Range<usize> {
        let start = (self.page_index * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn paginate<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.page_range(items.len())]
    }

    pub fn summary(&self, total: usize) -> Option<PageSummary> {
        let range = self.page_range(total);
        if range.is_empty() {
            return None;
        }
        Some(PageSummary {
            first_row: range.start + 1,
            last_row: range.end,
            total,
        })
    }
}

fn validate_page_size(page_size: usize) -> Result<(), TableError> {
    if PAGE_SIZE_OPTIONS.contains(&page_size) {
        Ok(())
    } else {
        Err(TableError::InvalidPageSize(page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_unknown_page_size() {
        assert_eq!(Pagination::new(7), Err(TableError::InvalidPageSize(7)));
        assert!(Pagination::new(25).is_ok());
    }

    #[test]
    fn test_previous_at_first_page_is_noop() {
        let mut p = Pagination::new(5).unwrap();
        p.previous();
        assert_eq!(p.page_index(), 0);
        assert!(!p.can_previous());
    }

    #[test]
    fn test_next_at_last_page_is_noop() {
        let mut p = Pagination::new(5).unwrap();
        p.last(12);
        assert_eq!(p.page_index(), 2);
        p.next(12);
        assert_eq!(p.page_index(), 2);
        assert!(!p.can_next(12));
    }

    #[test]
    fn test_navigation_with_no_rows() {
        let mut p = Pagination::default();
        assert_eq!(p.page_count(0), 0);
        p.next(0);
        p.last(0);
        assert_eq!(p.page_index(), 0);
        assert_eq!(p.page_range(0), 0..0);
        assert_eq!(p.summary(0), None);
    }

    #[test]
    fn test_clamp_after_rows_removed() {
        let mut p = Pagination::new(10).unwrap();
        p.last(45);
        assert_eq!(p.page_index(), 4);
        p.clamp(15);
        assert_eq!(p.page_index(), 1);
    }

    #[test]
    fn test_page_size_change_keeps_top_row() {
        let mut p = Pagination::new(10).unwrap();
        p.next(100);
        p.next(100);
        assert_eq!(p.page_range(100), 20..30);
        p.set_page_size(25).unwrap();
        assert_eq!(p.page_index(), 0);
        p.set_page_size(5).unwrap();
        assert_eq!(p.page_index(), 0);
        p.cycle_page_size(false);
        assert_eq!(p.page_size(), 50);
        p.cycle_page_size(true);
        assert_eq!(p.page_size(), 5);
    }

    #[test]
    fn test_summary() {
        let mut p = Pagination::new(10).unwrap();
        p.last(42);
        assert_eq!(
            p.summary(42),
            Some(PageSummary {
                first_row: 41,
                last_row: 42,
                total: 42
            })
        );
    }

    proptest! {
        #[test]
        fn prop_pages_concatenate_to_source(total in 0usize..200, size_idx in 0usize..4) {
            let items: Vec<usize> = (0..total).collect();
            let mut p = Pagination::new(PAGE_SIZE_OPTIONS[size_idx]).unwrap();
            let mut joined = Vec::new();
            let mut last_len = 0;
            for _ in 0..p.page_count(total) {
                let page = p.paginate(&items);
                last_len = page.len();
                joined.extend_from_slice(page);
                p.next(total);
            }
            prop_assert_eq!(joined, items);
            if total > 0 {
                let size = PAGE_SIZE_OPTIONS[size_idx];
                let expected = if total % size == 0 { size } else { total % size };
                prop_assert_eq!(last_len, expected);
            }
        }
    }
}
