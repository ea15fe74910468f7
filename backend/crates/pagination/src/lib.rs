//! Page arithmetic and list-state primitives shared by entity collections.
//!
//! Collections are fetched one page at a time and then kept current by
//! realtime merges. This crate owns the parts of that bookkeeping that do not
//! care where records came from: validated page sizes and numbers, the row
//! window a page maps onto, and the [`PageState`] whose `total_pages` is
//! always derived from `total_count` and the page size.

mod error;
mod page;
mod state;

pub use error::PaginationError;
pub use page::{PageNumber, PageRequest, PageSize, RowWindow};
pub use state::{PageState, PageSummary};
