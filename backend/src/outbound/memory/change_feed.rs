//! In-process change feed hub.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::RealtimeSettings;
use crate::domain::RawChangeEvent;
use crate::domain::ports::{ChangeFeed, ChangeFeedError, FeedSubscription, SubscriptionHandle};

struct Listener {
    handle: SubscriptionHandle,
    sender: mpsc::Sender<RawChangeEvent>,
}

/// Fans published events out to every listener on a table.
///
/// Each listener gets its own bounded channel; publishing waits for space, so
/// a slow consumer applies back-pressure instead of losing events.
pub struct InMemoryChangeFeed {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    buffer: usize,
    refusing: AtomicBool,
}

impl InMemoryChangeFeed {
    /// Hub whose listener channels hold `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
            refusing: AtomicBool::new(false),
        }
    }

    pub fn from_settings(settings: &RealtimeSettings) -> Self {
        Self::new(settings.event_buffer())
    }

    fn listeners(&self) -> MutexGuard<'_, HashMap<String, Vec<Listener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `event` to every listener on `table`.
    ///
    /// Returns how many listeners received it. Listeners whose receiver is
    /// gone are pruned.
    pub async fn publish(&self, table: &str, event: RawChangeEvent) -> usize {
        let targets: Vec<_> = self
            .listeners()
            .get(table)
            .map(|listeners| {
                listeners
                    .iter()
                    .map(|listener| (listener.handle.clone(), listener.sender.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut delivered = 0;
        for (handle, sender) in targets {
            if sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            } else {
                debug!(table, subscription = %handle.id(), "pruning closed listener");
                self.unsubscribe(&handle);
            }
        }
        delivered
    }

    /// Number of open listeners on `table`.
    pub fn listener_count(&self, table: &str) -> usize {
        self.listeners().get(table).map_or(0, Vec::len)
    }

    /// Drop every listener on `table`, as a lost connection would.
    pub fn disconnect(&self, table: &str) {
        let dropped = self.listeners().remove(table).map_or(0, |listeners| listeners.len());
        debug!(table, dropped, "listeners disconnected");
    }

    /// Make later subscription attempts fail as if the service were offline.
    pub fn refuse_subscriptions(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }
}

impl Default for InMemoryChangeFeed {
    fn default() -> Self {
        Self::from_settings(&RealtimeSettings::default())
    }
}

#[async_trait]
impl ChangeFeed for InMemoryChangeFeed {
    async fn subscribe(&self, table: &str) -> Result<FeedSubscription, ChangeFeedError> {
        if self.refusing.load(Ordering::SeqCst) {
            return Err(ChangeFeedError::unavailable("in-memory feed is refusing subscriptions"));
        }
        let (sender, events) = mpsc::channel(self.buffer);
        let handle = SubscriptionHandle::new(table);
        self.listeners()
            .entry(table.to_owned())
            .or_default()
            .push(Listener {
                handle: handle.clone(),
                sender,
            });
        Ok(FeedSubscription { handle, events })
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut listeners = self.listeners();
        if let Some(table) = listeners.get_mut(handle.table()) {
            table.retain(|listener| listener.handle != *handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[tokio::test]
    async fn events_reach_every_listener_on_the_table() {
        let feed = InMemoryChangeFeed::new(4);
        let mut first = feed.subscribe("clients").await.expect("subscribed");
        let mut second = feed.subscribe("clients").await.expect("subscribed");
        let mut other = feed.subscribe("jobs").await.expect("subscribed");

        let delivered = feed
            .publish("clients", RawChangeEvent::delete(json!({ "id": 1 })))
            .await;

        assert_eq!(delivered, 2);
        assert!(first.events.recv().await.is_some());
        assert!(second.events.recv().await.is_some());
        assert!(other.events.try_recv().is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn unsubscribe_closes_only_that_listener() {
        let feed = InMemoryChangeFeed::new(4);
        let mut first = feed.subscribe("clients").await.expect("subscribed");
        let _second = feed.subscribe("clients").await.expect("subscribed");

        feed.unsubscribe(&first.handle);
        feed.unsubscribe(&first.handle);

        assert_eq!(feed.listener_count("clients"), 1);
        assert!(first.events.recv().await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn closed_receivers_are_pruned_on_publish() {
        let feed = InMemoryChangeFeed::new(4);
        let subscription = feed.subscribe("jobs").await.expect("subscribed");
        drop(subscription);

        let delivered = feed
            .publish("jobs", RawChangeEvent::delete(json!({ "id": 2 })))
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(feed.listener_count("jobs"), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn refusing_feed_rejects_subscriptions() {
        let feed = InMemoryChangeFeed::default();
        feed.refuse_subscriptions(true);

        let error = feed.subscribe("clients").await.expect_err("refused");

        assert!(matches!(error, ChangeFeedError::Unavailable { .. }));
    }
}
