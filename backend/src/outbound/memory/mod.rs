//! In-process adapters for the feed and table ports.
//!
//! Used by tests and local development in place of the hosted backend.

mod change_feed;
mod table;

pub use change_feed::InMemoryChangeFeed;
pub use table::InMemoryTable;
