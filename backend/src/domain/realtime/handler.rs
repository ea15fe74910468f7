//! Per-event reconciliation against a collection store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::change_event::{MalformedEvent, ParsedChange, RawChangeEvent, decode_payload};
use crate::domain::collection::{EventTicket, MergeOutcome};
use crate::domain::ports::{RecordRefetcher, RefetchError};
use crate::domain::records::{EntityRecord, RecordId};
use crate::domain::store::CollectionStore;

/// Why an event left the collection untouched without merging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("malformed event: {0}")]
    Malformed(#[from] MalformedEvent),
    #[error(transparent)]
    RefetchFailed(#[from] RefetchError),
    #[error("refetch exceeded {0:?}")]
    RefetchTimedOut(Duration),
    #[error("refetch found no row")]
    RefetchMissing,
    #[error("refetch returned row {returned} for event on {requested}")]
    IdMismatch {
        requested: RecordId,
        returned: RecordId,
    },
    #[error("subscription closed before the event was merged")]
    Unsubscribed,
}

/// Result of handling one change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Merged(MergeOutcome),
    Dropped(DropReason),
}

/// Applies change events for one subscription, in the order given.
pub(crate) struct EventHandler<R> {
    pub(crate) store: CollectionStore<R>,
    pub(crate) refetcher: Option<Arc<dyn RecordRefetcher<R>>>,
    pub(crate) refetch_timeout: Duration,
    pub(crate) live: Arc<AtomicBool>,
}

impl<R: EntityRecord> EventHandler<R> {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Reconcile `event`, which arrived with `ticket`.
    pub(crate) async fn handle(&self, event: RawChangeEvent, ticket: EventTicket) -> HandleOutcome {
        let change = match event.parse() {
            Ok(change) => change,
            Err(error) => return HandleOutcome::Dropped(error.into()),
        };
        match change {
            ParsedChange::Delete { id } => {
                if !self.is_live() {
                    return HandleOutcome::Dropped(DropReason::Unsubscribed);
                }
                HandleOutcome::Merged(self.store.apply_delete(&id, ticket))
            }
            ParsedChange::Upsert { id, payload, .. } => {
                let record = match self.resolve(&id, payload).await {
                    Ok(record) => record,
                    Err(reason) => return HandleOutcome::Dropped(reason),
                };
                if !self.is_live() {
                    return HandleOutcome::Dropped(DropReason::Unsubscribed);
                }
                if record.id() != &id {
                    return HandleOutcome::Dropped(DropReason::IdMismatch {
                        requested: id,
                        returned: record.id().clone(),
                    });
                }
                HandleOutcome::Merged(self.store.apply_upsert(record, ticket))
            }
        }
    }

    async fn resolve(&self, id: &RecordId, payload: serde_json::Value) -> Result<R, DropReason> {
        let Some(refetcher) = &self.refetcher else {
            return decode_payload(payload).map_err(DropReason::from);
        };
        match timeout(self.refetch_timeout, refetcher.refetch(id)).await {
            Ok(Ok(Some(record))) => Ok(record),
            Ok(Ok(None)) => Err(DropReason::RefetchMissing),
            Ok(Err(error)) => Err(error.into()),
            Err(_) => Err(DropReason::RefetchTimedOut(self.refetch_timeout)),
        }
    }
}

/// Emit the log line for a handled event.
pub(crate) fn log_outcome(table: &str, ticket: EventTicket, outcome: &HandleOutcome) {
    let ticket = ticket.get();
    match outcome {
        HandleOutcome::Merged(MergeOutcome::Stale) => {
            debug!(table, ticket, "discarded merge older than the row's last change");
        }
        HandleOutcome::Merged(merge) => debug!(table, ticket, ?merge, "change merged"),
        HandleOutcome::Dropped(reason @ (DropReason::Unsubscribed | DropReason::RefetchMissing)) => {
            debug!(table, ticket, %reason, "change dropped");
        }
        HandleOutcome::Dropped(reason) => warn!(table, ticket, error = %reason, "change dropped"),
    }
}
