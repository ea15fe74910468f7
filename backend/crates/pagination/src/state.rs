//! Page bookkeeping for one entity collection.

use serde::{Deserialize, Serialize};

use crate::{PageNumber, PageRequest, PageSize};

/// Current page, total row count, and fixed page size for a collection.
///
/// ## Invariants
/// - `total_pages` is never stored; it is derived from `total_count` and
///   `page_size` on every read.
/// - `total_pages` is at least 1, so pagination controls stay well-defined
///   for empty collections.
///
/// # Examples
/// ```
/// use pagination::{PageNumber, PageSize, PageState};
///
/// let mut state = PageState::new(PageSize::new(20).expect("size"));
/// assert_eq!(state.total_pages(), 1);
///
/// state.replace(41, PageNumber::new(2).expect("page"));
/// assert_eq!(state.total_pages(), 3);
///
/// state.record_inserted();
/// assert_eq!(state.total_count(), 42);
/// assert_eq!(state.current_page().get(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page_size: PageSize,
    current_page: PageNumber,
    total_count: u64,
}

impl PageState {
    /// Empty state positioned on the first page.
    #[must_use]
    pub const fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            current_page: PageNumber::FIRST,
            total_count: 0,
        }
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Page currently shown.
    #[must_use]
    pub const fn current_page(&self) -> PageNumber {
        self.current_page
    }

    /// Total rows known to the backing table.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of pages, never less than one.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        let pages = self.total_count.div_ceil(self.page_size.get() as u64);
        if pages == 0 { 1 } else { pages }
    }

    /// Request for the page currently shown.
    #[must_use]
    pub const fn current_request(&self) -> PageRequest {
        PageRequest::new(self.current_page, self.page_size)
    }

    /// Apply the result of a successful paged fetch.
    pub const fn replace(&mut self, total_count: u64, current_page: PageNumber) {
        self.total_count = total_count;
        self.current_page = current_page;
    }

    /// Move to another page without touching the count.
    pub const fn set_current_page(&mut self, page: PageNumber) {
        self.current_page = page;
    }

    /// Account for one net insert merged into the collection.
    pub const fn record_inserted(&mut self) {
        self.total_count = self.total_count.saturating_add(1);
    }

    /// Account for one net removal from the collection.
    ///
    /// Saturates at zero when the count was never loaded.
    pub const fn record_removed(&mut self) {
        self.total_count = self.total_count.saturating_sub(1);
    }

    /// Serialisable view of the state.
    #[must_use]
    pub const fn summary(&self) -> PageSummary {
        PageSummary {
            current_page: self.current_page.get(),
            total_count: self.total_count,
            total_pages: self.total_pages(),
        }
    }
}

/// Pagination view handed to list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    /// Page currently shown (1-based).
    pub current_page: u32,
    /// Total rows known to the backing table.
    pub total_count: u64,
    /// Derived page count, at least 1.
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page state bookkeeping.

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn state() -> PageState {
        PageState::new(PageSize::new(15).expect("valid size"))
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(15, 1)]
    #[case(16, 2)]
    #[case(45, 3)]
    #[case(46, 4)]
    fn total_pages_is_derived_from_count(
        mut state: PageState,
        #[case] total: u64,
        #[case] expected: u64,
    ) {
        state.replace(total, PageNumber::FIRST);
        assert_eq!(state.total_pages(), expected);
    }

    #[rstest]
    fn realtime_adjustments_keep_the_current_page(mut state: PageState) {
        let page = PageNumber::new(3).expect("valid page");
        state.replace(40, page);

        state.record_inserted();
        state.record_removed();
        state.record_removed();

        assert_eq!(state.total_count(), 39);
        assert_eq!(state.current_page(), page);
    }

    #[rstest]
    fn removal_saturates_at_zero(mut state: PageState) {
        state.record_removed();
        assert_eq!(state.total_count(), 0);
        assert_eq!(state.total_pages(), 1);
    }

    #[rstest]
    fn summary_serialises_camel_case(mut state: PageState) {
        state.replace(31, PageNumber::new(2).expect("valid page"));
        let json = serde_json::to_value(state.summary()).expect("summary serialises");
        assert_eq!(
            json,
            serde_json::json!({ "currentPage": 2, "totalCount": 31, "totalPages": 3 })
        );
    }
}
