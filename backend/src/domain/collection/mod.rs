//! Ordered, deduplicated per-entity collection.
//!
//! Rows are kept newest first and no identifier appears twice. Realtime
//! merges carry an [`EventTicket`]; the collection remembers the last ticket
//! applied to each identifier and discards merges older than it, so a slow
//! refetch can never overwrite newer data or bring back a deleted row.
//! Paged fetches are ticketed the same way, and only the most recently begun
//! fetch may land. A single-record detail slot follows the same rule.

use std::collections::HashMap;
use std::collections::HashSet;

use pagination::{PageNumber, PageSize, PageState, PageSummary};

use super::records::{EntityRecord, RecordId};

/// Arrival order of a change event within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventTicket(u64);

impl EventTicket {
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Progress of the paged fetch that populates the collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed { message: String },
}

/// Effect of a merge or mutation on the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Row added at the head; count incremented.
    Inserted,
    /// Existing row replaced in place.
    Replaced,
    /// Row removed; count decremented.
    Removed,
    /// Row already held identical data.
    Unchanged,
    /// Target row not present; nothing done.
    Absent,
    /// Older than the last merge for this identifier; discarded.
    Stale,
}

impl MergeOutcome {
    /// Whether observers should be told about the merge.
    pub const fn changed(self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced | Self::Removed)
    }
}

/// Rows, page state and load status for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCollection<R> {
    items: Vec<R>,
    page: PageState,
    status: LoadStatus,
    applied: HashMap<RecordId, EventTicket>,
    floor: EventTicket,
    latest_load: EventTicket,
    detail: Option<R>,
    detail_status: LoadStatus,
    latest_detail: EventTicket,
}

impl<R: EntityRecord> EntityCollection<R> {
    /// Empty collection on the first page.
    pub fn new(page_size: PageSize) -> Self {
        Self {
            items: Vec::new(),
            page: PageState::new(page_size),
            status: LoadStatus::Idle,
            applied: HashMap::new(),
            floor: EventTicket::default(),
            latest_load: EventTicket::default(),
            detail: None,
            detail_status: LoadStatus::Idle,
            latest_detail: EventTicket::default(),
        }
    }

    /// Rows, newest first.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn summary(&self) -> PageSummary {
        self.page.summary()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Full record shown on a detail view, if one has loaded.
    pub fn detail(&self) -> Option<&R> {
        self.detail.as_ref()
    }

    pub fn detail_status(&self) -> &LoadStatus {
        &self.detail_status
    }

    /// Identifiers whose last merge ticket is still remembered.
    pub fn tracked_rows(&self) -> usize {
        self.applied.len()
    }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Whether a merge for `id` carrying `ticket` arrived too late.
    pub fn is_stale(&self, id: &RecordId, ticket: EventTicket) -> bool {
        ticket < self.floor
            || self
                .applied
                .get(id)
                .is_some_and(|last_applied| ticket < *last_applied)
    }

    /// Merge an inserted or updated row from the change feed.
    ///
    /// An existing row is replaced in place. An absent row is inserted at the
    /// head and counted, including when the event was an update.
    pub fn apply_upsert(&mut self, record: R, ticket: EventTicket) -> MergeOutcome {
        if self.is_stale(record.id(), ticket) {
            return MergeOutcome::Stale;
        }
        self.applied.insert(record.id().clone(), ticket);
        self.upsert(record)
    }

    /// Merge a deletion from the change feed.
    ///
    /// The ticket is remembered even when the row is absent so that an older
    /// upsert still in flight cannot re-insert it.
    pub fn apply_delete(&mut self, id: &RecordId, ticket: EventTicket) -> MergeOutcome {
        if self.is_stale(id, ticket) {
            return MergeOutcome::Stale;
        }
        self.applied.insert(id.clone(), ticket);
        self.remove(id)
    }

    /// Add a row created by a local mutation if the feed has not already.
    pub fn record_created(&mut self, record: R) -> MergeOutcome {
        if self.contains(record.id()) {
            return MergeOutcome::Unchanged;
        }
        self.upsert(record)
    }

    /// Replace a row edited by a local mutation; never inserts.
    pub fn record_updated(&mut self, record: R) -> MergeOutcome {
        if !self.contains(record.id()) {
            return MergeOutcome::Absent;
        }
        self.upsert(record)
    }

    /// Remove a row deleted by a local mutation.
    pub fn record_deleted(&mut self, id: &RecordId) -> MergeOutcome {
        self.remove(id)
    }

    fn upsert(&mut self, record: R) -> MergeOutcome {
        match self.position(record.id()) {
            Some(index) => match self.items.get_mut(index) {
                Some(existing) if *existing == record => MergeOutcome::Unchanged,
                Some(existing) => {
                    *existing = record;
                    MergeOutcome::Replaced
                }
                None => MergeOutcome::Absent,
            },
            None => {
                self.items.insert(0, record);
                self.page.record_inserted();
                MergeOutcome::Inserted
            }
        }
    }

    fn remove(&mut self, id: &RecordId) -> MergeOutcome {
        match self.position(id) {
            Some(index) => {
                self.items.remove(index);
                self.page.record_removed();
                MergeOutcome::Removed
            }
            None => MergeOutcome::Absent,
        }
    }

    /// Mark the paged fetch ticketed `issued` as started.
    ///
    /// Returns whether the status moved. Any fetch begun earlier is
    /// superseded and its result will be ignored.
    pub fn begin_load(&mut self, issued: EventTicket) -> bool {
        self.latest_load = self.latest_load.max(issued);
        if self.status == LoadStatus::Loading {
            return false;
        }
        self.status = LoadStatus::Loading;
        true
    }

    fn is_superseded(&self, issued: EventTicket) -> bool {
        issued < self.latest_load
    }

    /// Apply a successful paged fetch. Returns whether it was applied.
    ///
    /// Rows, total count and current page are replaced together. Realtime
    /// merges ticketed before `issued` are older than the fetched rows and
    /// will be discarded from now on. A fetch superseded by a later
    /// [`Self::begin_load`] changes nothing.
    pub fn finish_load(
        &mut self,
        issued: EventTicket,
        rows: Vec<R>,
        total_count: u64,
        page: PageNumber,
    ) -> bool {
        if self.is_superseded(issued) {
            return false;
        }
        let mut seen = HashSet::with_capacity(rows.len());
        self.items = rows
            .into_iter()
            .filter(|row| seen.insert(row.id().clone()))
            .collect();
        self.page.replace(total_count, page);
        self.status = LoadStatus::Succeeded;
        self.floor = self.floor.max(issued);
        self.applied.retain(|_, ticket| *ticket >= issued);
        true
    }

    /// Record a failed paged fetch; rows already shown stay in place.
    ///
    /// Returns whether the failure was recorded. Superseded fetches are
    /// ignored.
    pub fn fail_load(&mut self, issued: EventTicket, message: impl Into<String>) -> bool {
        if self.is_superseded(issued) {
            return false;
        }
        self.status = LoadStatus::Failed {
            message: message.into(),
        };
        true
    }

    /// Start loading a detail record; the previous one is cleared.
    pub fn begin_detail(&mut self, issued: EventTicket) {
        self.latest_detail = self.latest_detail.max(issued);
        self.detail = None;
        self.detail_status = LoadStatus::Loading;
    }

    /// Show `record` on the detail slot unless a later request superseded
    /// it. Returns whether it was applied.
    pub fn finish_detail(&mut self, issued: EventTicket, record: R) -> bool {
        if issued < self.latest_detail {
            return false;
        }
        self.detail = Some(record);
        self.detail_status = LoadStatus::Succeeded;
        true
    }

    /// Record a failed detail load unless a later request superseded it.
    pub fn fail_detail(&mut self, issued: EventTicket, message: impl Into<String>) -> bool {
        if issued < self.latest_detail {
            return false;
        }
        self.detail_status = LoadStatus::Failed {
            message: message.into(),
        };
        true
    }

    /// Forget merge tickets older than `horizon`.
    ///
    /// Safe once no merge ticketed below `horizon` can still arrive. Returns
    /// how many entries were dropped.
    pub fn prune_applied(&mut self, horizon: EventTicket) -> usize {
        let before = self.applied.len();
        self.applied.retain(|_, ticket| *ticket >= horizon);
        before - self.applied.len()
    }

    /// Move to another page. Returns whether the page changed.
    pub fn set_current_page(&mut self, page: PageNumber) -> bool {
        if self.page.current_page() == page {
            return false;
        }
        self.page.set_current_page(page);
        true
    }
}
