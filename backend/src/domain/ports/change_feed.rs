//! Port for the push change feed of a table.
//!
//! A subscription yields a bounded channel of raw events for one table. The
//! adapter owns the transport; closing the sender signals disconnection.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::define_port_error;
use crate::domain::change_event::RawChangeEvent;

define_port_error! {
    /// Errors raised while opening a feed subscription.
    pub enum ChangeFeedError {
        /// The service refused the subscription.
        Rejected { table: String, message: String } => "feed refused subscription to {table}: {message}",
        /// The feed transport is not reachable.
        Unavailable { message: String } => "change feed unavailable: {message}",
    }
}

/// Opaque handle identifying one feed listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: Uuid,
    table: String,
}

impl SubscriptionHandle {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            table: table.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// A confirmed subscription and its event stream.
#[derive(Debug)]
pub struct FeedSubscription {
    pub handle: SubscriptionHandle,
    pub events: mpsc::Receiver<RawChangeEvent>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a listener for every change to `table`.
    ///
    /// Returns once the feed confirms the subscription.
    async fn subscribe(&self, table: &str) -> Result<FeedSubscription, ChangeFeedError>;

    /// Release a listener.
    ///
    /// Synchronous so teardown on drop can always release the handle.
    /// Releasing an unknown handle is a no-op.
    fn unsubscribe(&self, handle: &SubscriptionHandle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn handles_are_unique_per_subscription() {
        let first = SubscriptionHandle::new("jobs");
        let second = SubscriptionHandle::new("jobs");
        assert_ne!(first, second);
        assert_eq!(first.table(), "jobs");
    }

    #[rstest]
    fn rejection_names_the_table() {
        let error = ChangeFeedError::rejected("clients", "quota exceeded");
        assert_eq!(
            error.to_string(),
            "feed refused subscription to clients: quota exceeded"
        );
    }
}
