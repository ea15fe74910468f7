//! Domain ports and supporting types for the hexagonal boundary.
//!
//! The reconciler and list loader talk to the hosted backend only through
//! these traits. Each exposes a typed error enum so adapters map transport
//! failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod change_feed;
mod page_query;
mod record_refetcher;

#[cfg(test)]
pub use change_feed::MockChangeFeed;
pub use change_feed::{ChangeFeed, ChangeFeedError, FeedSubscription, SubscriptionHandle};
pub use page_query::{FetchedPage, PageQuery, PageQueryError};
pub use record_refetcher::{RecordRefetcher, RefetchError};
