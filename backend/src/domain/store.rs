//! Observable state container for entity collections.
//!
//! Each [`CollectionStore`] owns one [`EntityCollection`] behind a
//! `tokio::sync::watch` channel. Every mutation goes through a named handler
//! and observers are woken only when the collection actually changed.
//! Tickets handed out by a store stay in flight until settled; per-row merge
//! bookkeeping older than every in-flight ticket is pruned as they settle.
//! [`BackOfficeStore`] groups one store per entity and is built once at
//! start-up, then passed to whatever needs it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pagination::{PageNumber, PageSize};
use tokio::sync::watch;

use super::collection::{EntityCollection, EventTicket, MergeOutcome};
use super::ports::FetchedPage;
use super::records::{
    Candidate, Client, EntityRecord, Job, RecordId, Referrer, StaffMember, Visitor,
};
use crate::config::RealtimeSettings;

struct StoreInner<R> {
    state: watch::Sender<EntityCollection<R>>,
    tickets: AtomicU64,
    in_flight: Mutex<BTreeSet<EventTicket>>,
}

/// Shared handle to one entity collection.
pub struct CollectionStore<R> {
    inner: Arc<StoreInner<R>>,
}

impl<R> Clone for CollectionStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: EntityRecord> fmt::Debug for CollectionStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionStore")
            .field("table", &R::TABLE)
            .field("rows", &self.read(EntityCollection::len))
            .finish_non_exhaustive()
    }
}

impl<R: EntityRecord> CollectionStore<R> {
    /// Empty store paging by `page_size`.
    pub fn new(page_size: PageSize) -> Self {
        let (state, _) = watch::channel(EntityCollection::new(page_size));
        Self {
            inner: Arc::new(StoreInner {
                state,
                tickets: AtomicU64::new(0),
                in_flight: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// Hand out the next arrival ticket.
    ///
    /// Tickets are strictly increasing across every subscription and loader
    /// sharing this store.
    /// The ticket stays in flight until passed to [`Self::settle`].
    pub fn issue_ticket(&self) -> EventTicket {
        let mut in_flight = self.in_flight();
        let ticket = EventTicket::new(self.inner.tickets.fetch_add(1, Ordering::AcqRel) + 1);
        in_flight.insert(ticket);
        ticket
    }

    /// Release `ticket` once its merge or load has landed or been dropped.
    ///
    /// Merge bookkeeping older than every ticket still in flight is pruned.
    pub fn settle(&self, ticket: EventTicket) {
        let horizon = {
            let mut in_flight = self.in_flight();
            in_flight.remove(&ticket);
            in_flight.first().copied().unwrap_or_else(|| {
                EventTicket::new(self.inner.tickets.load(Ordering::Acquire) + 1)
            })
        };
        self.inner.state.send_if_modified(|collection| {
            collection.prune_applied(horizon);
            false
        });
    }

    fn in_flight(&self) -> MutexGuard<'_, BTreeSet<EventTicket>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Observe the collection; the receiver is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<EntityCollection<R>> {
        self.inner.state.subscribe()
    }

    /// Clone of the current collection.
    pub fn snapshot(&self) -> EntityCollection<R> {
        self.inner.state.borrow().clone()
    }

    /// Run `read` against the current collection without cloning it.
    pub fn read<T>(&self, read: impl FnOnce(&EntityCollection<R>) -> T) -> T {
        read(&self.inner.state.borrow())
    }

    fn merge(&self, apply: impl FnOnce(&mut EntityCollection<R>) -> MergeOutcome) -> MergeOutcome {
        let mut outcome = MergeOutcome::Unchanged;
        self.inner.state.send_if_modified(|collection| {
            outcome = apply(collection);
            outcome.changed()
        });
        outcome
    }

    /// Merge a feed upsert carrying `ticket`.
    pub fn apply_upsert(&self, record: R, ticket: EventTicket) -> MergeOutcome {
        self.merge(|collection| collection.apply_upsert(record, ticket))
    }

    /// Merge a feed delete carrying `ticket`.
    pub fn apply_delete(&self, id: &RecordId, ticket: EventTicket) -> MergeOutcome {
        self.merge(|collection| collection.apply_delete(id, ticket))
    }

    /// Whether a merge for `id` carrying `ticket` would be discarded.
    pub fn is_stale(&self, id: &RecordId, ticket: EventTicket) -> bool {
        self.read(|collection| collection.is_stale(id, ticket))
    }

    pub fn record_created(&self, record: R) -> MergeOutcome {
        self.merge(|collection| collection.record_created(record))
    }

    pub fn record_updated(&self, record: R) -> MergeOutcome {
        self.merge(|collection| collection.record_updated(record))
    }

    pub fn record_deleted(&self, id: &RecordId) -> MergeOutcome {
        self.merge(|collection| collection.record_deleted(id))
    }

    /// Mark a paged fetch as started and return its ticket.
    ///
    /// The ticket fences older realtime merges once the fetch lands and
    /// supersedes any fetch begun before it.
    pub fn begin_load(&self) -> EventTicket {
        let issued = self.issue_ticket();
        self.inner
            .state
            .send_if_modified(|collection| collection.begin_load(issued));
        issued
    }

    /// Apply a successful paged fetch started with `issued`.
    ///
    /// Returns `false` when a later fetch superseded it.
    pub fn finish_load(
        &self,
        issued: EventTicket,
        fetched: FetchedPage<R>,
        page: PageNumber,
    ) -> bool {
        let applied = self.inner.state.send_if_modified(|collection| {
            collection.finish_load(issued, fetched.items, fetched.total_count, page)
        });
        self.settle(issued);
        applied
    }

    /// Record the failure of the fetch started with `issued`.
    ///
    /// Returns `false` when a later fetch superseded it.
    pub fn fail_load(&self, issued: EventTicket, message: impl Into<String>) -> bool {
        let message = message.into();
        let recorded = self
            .inner
            .state
            .send_if_modified(|collection| collection.fail_load(issued, message));
        self.settle(issued);
        recorded
    }

    /// Mark a detail load as started and return its ticket.
    pub fn begin_detail(&self) -> EventTicket {
        let issued = self.issue_ticket();
        self.inner
            .state
            .send_modify(|collection| collection.begin_detail(issued));
        issued
    }

    /// Show the record fetched for the detail load `issued`.
    ///
    /// Returns `false` when a later detail load superseded it.
    pub fn finish_detail(&self, issued: EventTicket, record: R) -> bool {
        let applied = self
            .inner
            .state
            .send_if_modified(|collection| collection.finish_detail(issued, record));
        self.settle(issued);
        applied
    }

    /// Record the failure of the detail load `issued`.
    pub fn fail_detail(&self, issued: EventTicket, message: impl Into<String>) -> bool {
        let message = message.into();
        let recorded = self
            .inner
            .state
            .send_if_modified(|collection| collection.fail_detail(issued, message));
        self.settle(issued);
        recorded
    }

    pub fn set_current_page(&self, page: PageNumber) {
        self.inner
            .state
            .send_if_modified(|collection| collection.set_current_page(page));
    }
}

/// One store per back-office entity.
#[derive(Debug, Clone)]
pub struct BackOfficeStore {
    clients: CollectionStore<Client>,
    candidates: CollectionStore<Candidate>,
    jobs: CollectionStore<Job>,
    visitors: CollectionStore<Visitor>,
    referrers: CollectionStore<Referrer>,
    staff: CollectionStore<StaffMember>,
}

impl BackOfficeStore {
    /// Build every store with the page sizes from `settings`.
    pub fn from_settings(settings: &RealtimeSettings) -> Self {
        Self {
            clients: CollectionStore::new(settings.page_size_for::<Client>()),
            candidates: CollectionStore::new(settings.page_size_for::<Candidate>()),
            jobs: CollectionStore::new(settings.page_size_for::<Job>()),
            visitors: CollectionStore::new(settings.page_size_for::<Visitor>()),
            referrers: CollectionStore::new(settings.page_size_for::<Referrer>()),
            staff: CollectionStore::new(settings.page_size_for::<StaffMember>()),
        }
    }

    pub fn clients(&self) -> &CollectionStore<Client> {
        &self.clients
    }

    pub fn candidates(&self) -> &CollectionStore<Candidate> {
        &self.candidates
    }

    pub fn jobs(&self) -> &CollectionStore<Job> {
        &self.jobs
    }

    pub fn visitors(&self) -> &CollectionStore<Visitor> {
        &self.visitors
    }

    pub fn referrers(&self) -> &CollectionStore<Referrer> {
        &self.referrers
    }

    pub fn staff(&self) -> &CollectionStore<StaffMember> {
        &self.staff
    }
}

impl Default for BackOfficeStore {
    fn default() -> Self {
        Self::from_settings(&RealtimeSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> CollectionStore<Client> {
        CollectionStore::new(PageSize::new(15).expect("valid size"))
    }

    #[rstest]
    fn tickets_increase_across_clones(store: CollectionStore<Client>) {
        let other = store.clone();
        let first = store.issue_ticket();
        let second = other.issue_ticket();
        assert!(second > first);
    }

    #[rstest]
    fn observers_are_woken_only_by_real_changes(store: CollectionStore<Client>) {
        let mut observer = store.subscribe();
        observer.mark_unchanged();

        let ticket = store.issue_ticket();
        assert_eq!(
            store.apply_upsert(client(1, "Acme"), ticket),
            MergeOutcome::Inserted
        );
        assert!(observer.has_changed().expect("store alive"));
        observer.mark_unchanged();

        assert_eq!(
            store.apply_upsert(client(1, "Acme"), ticket),
            MergeOutcome::Unchanged
        );
        assert_eq!(
            store.apply_delete(&RecordId::from(2), store.issue_ticket()),
            MergeOutcome::Absent
        );
        assert!(!observer.has_changed().expect("store alive"));
    }

    #[rstest]
    fn load_lifecycle_updates_status_and_rows(store: CollectionStore<Client>) {
        let issued = store.begin_load();
        let applied = store.finish_load(
            issued,
            FetchedPage {
                items: vec![client(2, "Beta"), client(1, "Alpha")],
                total_count: 31,
            },
            PageNumber::new(2).expect("valid page"),
        );

        assert!(applied);
        let summary = store.read(EntityCollection::summary);
        assert_eq!(summary.total_pages, 3);
        assert_eq!(summary.current_page, 2);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[rstest]
    fn only_the_latest_page_request_lands(store: CollectionStore<Client>) {
        let first_page = store.begin_load();
        let second_page = store.begin_load();

        assert!(store.finish_load(
            second_page,
            FetchedPage {
                items: vec![client(16, "Second page")],
                total_count: 16,
            },
            PageNumber::new(2).expect("valid page"),
        ));
        assert!(!store.finish_load(
            first_page,
            FetchedPage {
                items: vec![client(1, "First page")],
                total_count: 16,
            },
            PageNumber::FIRST,
        ));

        assert_eq!(store.read(|c| c.page().current_page().get()), 2);
        assert_eq!(store.read(|c| c.items()[0].company_name.clone()), "Second page");
    }

    #[rstest]
    fn settling_prunes_bookkeeping_no_ticket_can_reach(store: CollectionStore<Client>) {
        let slow = store.issue_ticket();
        let delete = store.issue_ticket();
        store.apply_delete(&RecordId::from(7), delete);
        store.settle(delete);

        assert_eq!(store.read(EntityCollection::tracked_rows), 1);
        assert_eq!(
            store.apply_upsert(client(7, "Resurrected"), slow),
            MergeOutcome::Stale
        );

        store.settle(slow);
        assert_eq!(store.read(EntityCollection::tracked_rows), 0);
    }

    #[rstest]
    fn grouped_store_uses_entity_page_sizes() {
        let stores = BackOfficeStore::default();
        assert_eq!(stores.clients().read(|c| c.page().page_size().get()), 15);
        assert_eq!(stores.candidates().read(|c| c.page().page_size().get()), 20);
        assert_eq!(stores.staff().read(|c| c.page().page_size().get()), 20);
    }
}
