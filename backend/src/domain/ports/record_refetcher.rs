//! Port for rehydrating a row by identifier.
//!
//! Feed payloads carry only base columns. A refetcher reads the row again
//! with its joins so the collection holds the same shape a list fetch does.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::records::RecordId;

define_port_error! {
    /// Errors raised while re-reading a row.
    pub enum RefetchError {
        /// Backend query failed.
        Backend { message: String } => "refetch failed: {message}",
        /// Row came back but does not decode into the entity type.
        Decode { message: String } => "refetched row does not decode: {message}",
    }
}

#[async_trait]
pub trait RecordRefetcher<R>: Send + Sync {
    /// Read the current version of row `id`, or `None` when it no longer
    /// exists.
    async fn refetch(&self, id: &RecordId) -> Result<Option<R>, RefetchError>;
}
