//! Test utilities for the backoffice crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled only for tests or with the `test-support` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::ports::{RecordRefetcher, RefetchError};
use crate::domain::{Candidate, Client, EntityRecord, Job, RecordId};

/// Client row with only the required columns set.
pub fn client(id: i64, company_name: &str) -> Client {
    Client {
        id: RecordId::from(id),
        company_name: company_name.to_owned(),
        focal_person_name: None,
        lt_number: None,
        country: None,
        created_at: None,
    }
}

/// Candidate row with only the required columns set.
pub fn candidate(id: i64, given_name: &str, family_name: &str) -> Candidate {
    Candidate {
        id: RecordId::from(id),
        given_name: given_name.to_owned(),
        family_name: family_name.to_owned(),
        passport_no: None,
        national_id: None,
        mobile_number: None,
        created_at: None,
    }
}

/// Job row without a joined client.
pub fn job(id: i64, job_title: &str) -> Job {
    Job {
        id: RecordId::from(id),
        job_title: job_title.to_owned(),
        client_id: None,
        client: None,
        created_at: None,
    }
}

/// Refetcher answering from a scripted row table.
///
/// Rows not scripted come back as `Ok(None)`. When gated, every call waits
/// for one [`Notify`] permit before answering.
pub struct ScriptedRefetcher<R> {
    rows: Mutex<HashMap<RecordId, Result<R, RefetchError>>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl<R: EntityRecord> Default for ScriptedRefetcher<R> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl<R: EntityRecord> ScriptedRefetcher<R> {
    #[must_use]
    pub fn with_row(self, row: R) -> Self {
        self.set_row(row);
        self
    }

    #[must_use]
    pub fn with_failure(self, id: RecordId, error: RefetchError) -> Self {
        self.rows().insert(id, Err(error));
        self
    }

    /// Hold every call until `gate` is notified.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the answer for the row's identifier.
    pub fn set_row(&self, row: R) {
        self.rows().insert(row.id().clone(), Ok(row));
    }

    /// Number of refetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<RecordId, Result<R, RefetchError>>> {
        self.rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<R: EntityRecord> RecordRefetcher<R> for ScriptedRefetcher<R> {
    async fn refetch(&self, id: &RecordId) -> Result<Option<R>, RefetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.rows().get(id) {
            Some(Ok(row)) => Ok(Some(row.clone())),
            Some(Err(error)) => Err(error.clone()),
            None => Ok(None),
        }
    }
}
