//! Port for fetching one page of a table.

use async_trait::async_trait;
use pagination::RowWindow;

use super::define_port_error;

define_port_error! {
    /// Errors raised by paged list queries.
    pub enum PageQueryError {
        /// Backend query failed.
        Backend { message: String } => "page query failed: {message}",
        /// Rows came back but do not decode into the entity type.
        Decode { message: String } => "page rows do not decode: {message}",
    }
}

/// Rows for one window plus the exact count of matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<R> {
    pub items: Vec<R>,
    pub total_count: u64,
}

#[async_trait]
pub trait PageQuery<R>: Send + Sync {
    /// Fetch rows in `window`, newest first, filtered by `search` when given.
    async fn fetch_page(
        &self,
        window: RowWindow,
        search: Option<&str>,
    ) -> Result<FetchedPage<R>, PageQueryError>;
}
