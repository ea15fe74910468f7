//! Validation errors for page primitives.

use thiserror::Error;

/// Errors raised when constructing page sizes and page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Page sizes must hold at least one row.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
    /// Page numbers are 1-based.
    #[error("page number must be at least 1")]
    ZeroPageNumber,
}
