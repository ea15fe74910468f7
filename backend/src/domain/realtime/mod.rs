//! Realtime reconciliation of a change feed into a collection store.
//!
//! [`RealtimeSync`] opens a feed subscription for the table behind `R` and
//! spawns one consumer task that handles events strictly one at a time, in
//! the order the feed delivered them. Upserts are optionally rehydrated
//! through a [`RecordRefetcher`]; deletes merge directly.
//!
//! The returned [`RealtimeSubscription`] guard owns the feed handle. Dropping
//! it, or calling [`RealtimeSubscription::unsubscribe`], releases the handle
//! and marks the subscription dead so results still in flight are discarded.
//! There is no automatic reconnection.

mod handler;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::change_event::RawChangeEvent;
use super::ports::{
    ChangeFeed, ChangeFeedError, FeedSubscription, RecordRefetcher, SubscriptionHandle,
};
use super::records::EntityRecord;
use super::store::CollectionStore;
use crate::config::RealtimeSettings;

pub(crate) use handler::EventHandler;
pub use handler::{DropReason, HandleOutcome};

/// Lifecycle of one feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribing,
    Active,
}

/// Builder for feed subscriptions that reconcile into one store.
pub struct RealtimeSync<R> {
    feed: Arc<dyn ChangeFeed>,
    store: CollectionStore<R>,
    refetcher: Option<Arc<dyn RecordRefetcher<R>>>,
    refetch_timeout: Duration,
    state: Arc<watch::Sender<SubscriptionState>>,
}

impl<R: EntityRecord> RealtimeSync<R> {
    /// Reconcile `feed` into `store`, merging payloads directly.
    pub fn new(feed: Arc<dyn ChangeFeed>, store: CollectionStore<R>) -> Self {
        Self {
            feed,
            store,
            refetcher: None,
            refetch_timeout: RealtimeSettings::default().refetch_timeout(),
            state: Arc::new(watch::channel(SubscriptionState::default()).0),
        }
    }

    /// Observe the lifecycle of the subscription this builder opens,
    /// including the `Subscribing` phase before the feed confirms.
    pub fn watch_state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    /// Rehydrate every insert and update through `refetcher`.
    #[must_use]
    pub fn with_refetcher(mut self, refetcher: Arc<dyn RecordRefetcher<R>>) -> Self {
        self.refetcher = Some(refetcher);
        self
    }

    /// Bound each refetch; events whose refetch overruns are dropped.
    #[must_use]
    pub fn with_refetch_timeout(mut self, refetch_timeout: Duration) -> Self {
        self.refetch_timeout = refetch_timeout;
        self
    }

    /// Apply timeouts from loaded settings.
    #[must_use]
    pub fn with_settings(self, settings: &RealtimeSettings) -> Self {
        self.with_refetch_timeout(settings.refetch_timeout())
    }

    /// Open the subscription and start consuming events.
    ///
    /// The state is `Subscribing` while the feed is asked and resolves to
    /// `Active` once it confirms.
    ///
    /// # Errors
    /// Returns the feed's error when it refuses the subscription; nothing is
    /// spawned in that case.
    pub async fn subscribe(&self) -> Result<RealtimeSubscription, ChangeFeedError> {
        let table = R::TABLE;
        let state = Arc::clone(&self.state);
        state.send_replace(SubscriptionState::Subscribing);
        debug!(table, "subscribing to change feed");

        let FeedSubscription { handle, events } = match self.feed.subscribe(table).await {
            Ok(subscription) => subscription,
            Err(error) => {
                state.send_replace(SubscriptionState::Unsubscribed);
                warn!(table, %error, "change feed subscription refused");
                return Err(error);
            }
        };

        let live = Arc::new(AtomicBool::new(true));
        let handled = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handler = EventHandler {
            store: self.store.clone(),
            refetcher: self.refetcher.clone(),
            refetch_timeout: self.refetch_timeout,
            live: Arc::clone(&live),
        };
        state.send_replace(SubscriptionState::Active);
        info!(table, subscription = %handle.id(), "change feed subscription active");

        let task = tokio::spawn(consume(
            handler,
            events,
            shutdown_rx,
            Arc::clone(&state),
            Arc::clone(&handled),
        ));

        Ok(RealtimeSubscription {
            handle,
            feed: Arc::clone(&self.feed),
            live,
            handled,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

enum Exit {
    Shutdown,
    Disconnected,
}

async fn consume<R: EntityRecord>(
    handler: EventHandler<R>,
    mut events: mpsc::Receiver<RawChangeEvent>,
    mut shutdown: oneshot::Receiver<()>,
    state: Arc<watch::Sender<SubscriptionState>>,
    handled: Arc<AtomicU64>,
) {
    let table = R::TABLE;
    let exit = loop {
        let event = tokio::select! {
            biased;
            _ = &mut shutdown => break Exit::Shutdown,
            event = events.recv() => event,
        };
        let Some(event) = event else {
            break Exit::Disconnected;
        };
        let ticket = handler.store.issue_ticket();
        let outcome = handler.handle(event, ticket).await;
        handler::log_outcome(table, ticket, &outcome);
        handler.store.settle(ticket);
        handled.fetch_add(1, Ordering::AcqRel);
    };

    if matches!(exit, Exit::Disconnected) && handler.live.swap(false, Ordering::AcqRel) {
        warn!(table, "change feed disconnected; subscription closed");
        state.send_replace(SubscriptionState::Unsubscribed);
    }
}

/// Guard for an active feed subscription.
///
/// Dropping the guard tears the subscription down.
pub struct RealtimeSubscription {
    handle: SubscriptionHandle,
    feed: Arc<dyn ChangeFeed>,
    live: Arc<AtomicBool>,
    handled: Arc<AtomicU64>,
    state: Arc<watch::Sender<SubscriptionState>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for RealtimeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeSubscription")
            .field("handle", &self.handle)
            .field("state", &self.state())
            .field("handled", &self.handled_events())
            .finish_non_exhaustive()
    }
}

impl RealtimeSubscription {
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Events taken off the feed and handled so far, merged or dropped.
    pub fn handled_events(&self) -> u64 {
        self.handled.load(Ordering::Acquire)
    }

    /// Observe lifecycle transitions, including feed disconnection.
    pub fn watch_state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    /// Tear the subscription down and release the feed handle.
    ///
    /// Idempotent. Results still in flight are discarded when they land.
    pub fn unsubscribe(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        self.live.store(false, Ordering::Release);
        if shutdown.send(()).is_err() {
            debug!(table = self.handle.table(), "consumer already stopped");
        }
        self.feed.unsubscribe(&self.handle);
        self.state.send_replace(SubscriptionState::Unsubscribed);
        info!(
            table = self.handle.table(),
            subscription = %self.handle.id(),
            "change feed subscription released"
        );
    }

    /// Wait for the consumer task to stop.
    ///
    /// Without a prior [`Self::unsubscribe`] this waits for the feed to
    /// disconnect. The feed handle is released afterwards either way.
    pub async fn finished(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(error) = task.await {
            warn!(table = self.handle.table(), %error, "change feed consumer ended abnormally");
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
