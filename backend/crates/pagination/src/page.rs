//! Validated page sizes, page numbers, and the row windows they select.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::PaginationError;

/// Number of rows shown per page.
///
/// # Examples
/// ```
/// use pagination::PageSize;
///
/// let size = PageSize::new(15).expect("non-zero size");
/// assert_eq!(size.get(), 15);
/// assert!(PageSize::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(NonZeroU32);

impl PageSize {
    /// Validate and construct a page size.
    ///
    /// # Errors
    /// Returns [`PaginationError::ZeroPageSize`] when `size` is zero.
    pub const fn new(size: u32) -> Result<Self, PaginationError> {
        match NonZeroU32::new(size) {
            Some(value) => Ok(Self(value)),
            None => Err(PaginationError::ZeroPageSize),
        }
    }

    /// Construct a page size from an already non-zero value.
    #[must_use]
    pub const fn from_non_zero(size: NonZeroU32) -> Self {
        Self(size)
    }

    /// Rows per page.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for PageSize {
    type Error = PaginationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    /// The first page.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Validate and construct a page number.
    ///
    /// # Errors
    /// Returns [`PaginationError::ZeroPageNumber`] when `page` is zero.
    pub const fn new(page: u32) -> Result<Self, PaginationError> {
        match NonZeroU32::new(page) {
            Some(value) => Ok(Self(value)),
            None => Err(PaginationError::ZeroPageNumber),
        }
    }

    /// The page number as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u32> for PageNumber {
    type Error = PaginationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageNumber> for u32 {
    fn from(value: PageNumber) -> Self {
        value.get()
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Inclusive zero-based row range selected by a page request.
///
/// Range queries against the backing service take `from..=to` offsets, so the
/// window is inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowWindow {
    /// First row offset (inclusive).
    pub from: u64,
    /// Last row offset (inclusive).
    pub to: u64,
}

impl RowWindow {
    /// Number of rows covered by the window.
    #[must_use]
    pub const fn len(self) -> u64 {
        self.to - self.from + 1
    }

    /// Windows always cover at least one row.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }
}

/// A request for one page of a collection.
///
/// # Examples
/// ```
/// use pagination::{PageNumber, PageRequest, PageSize};
///
/// let request = PageRequest::new(
///     PageNumber::new(3).expect("page"),
///     PageSize::new(20).expect("size"),
/// );
/// let window = request.window();
/// assert_eq!((window.from, window.to), (40, 59));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: PageNumber,
    size: PageSize,
}

impl PageRequest {
    /// Build a request for `page` with `size` rows per page.
    #[must_use]
    pub const fn new(page: PageNumber, size: PageSize) -> Self {
        Self { page, size }
    }

    /// Requested page.
    #[must_use]
    pub const fn page(self) -> PageNumber {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub const fn size(self) -> PageSize {
        self.size
    }

    /// Row window covered by this page.
    #[must_use]
    pub const fn window(self) -> RowWindow {
        let size = self.size.get() as u64;
        let from = (self.page.get() as u64 - 1) * size;
        RowWindow {
            from,
            to: from + size - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page primitives.

    use super::*;
    use rstest::rstest;

    fn request(page: u32, size: u32) -> PageRequest {
        PageRequest::new(
            PageNumber::new(page).expect("valid page"),
            PageSize::new(size).expect("valid size"),
        )
    }

    #[rstest]
    #[case(1, 20, 0, 19)]
    #[case(2, 20, 20, 39)]
    #[case(4, 15, 45, 59)]
    #[case(1, 1, 0, 0)]
    fn window_matches_range_offsets(
        #[case] page: u32,
        #[case] size: u32,
        #[case] from: u64,
        #[case] to: u64,
    ) {
        let window = request(page, size).window();
        assert_eq!(window, RowWindow { from, to });
        assert_eq!(window.len(), u64::from(size));
    }

    #[rstest]
    fn window_does_not_overflow_for_large_pages() {
        let window = request(u32::MAX, u32::MAX).window();
        assert_eq!(window.len(), u64::from(u32::MAX));
    }

    #[rstest]
    fn rejects_zero_values() {
        assert_eq!(PageSize::new(0), Err(PaginationError::ZeroPageSize));
        assert_eq!(PageNumber::new(0), Err(PaginationError::ZeroPageNumber));
    }

    #[rstest]
    fn page_size_deserialises_through_validation() {
        let size: PageSize = serde_json::from_str("15").expect("valid size");
        assert_eq!(size.get(), 15);
        assert!(serde_json::from_str::<PageSize>("0").is_err());
    }

    #[rstest]
    fn first_page_is_default() {
        assert_eq!(PageNumber::default().get(), 1);
    }
}
