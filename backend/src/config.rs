//! Realtime sync settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `BACKOFFICE_*` environment variables over a
//! config file. Timeouts and buffers carry defaults; page sizes fall back to
//! the entity default when unset.

use std::num::NonZeroU32;
use std::time::Duration;

use ortho_config::OrthoConfig;
use pagination::PageSize;
use serde::Deserialize;

use crate::domain::EntityRecord;

const DEFAULT_REFETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_EVENT_BUFFER: usize = 64;

/// Settings for feed consumption and list paging.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BACKOFFICE")]
pub struct RealtimeSettings {
    /// Upper bound on a single refetch-by-id, in milliseconds.
    #[ortho_config(default = 10_000)]
    pub refetch_timeout_ms: u64,
    /// Capacity of each subscription's event channel.
    #[ortho_config(default = 64)]
    pub event_buffer: usize,
    /// Rows per page on the clients list.
    pub clients_page_size: Option<u32>,
    /// Rows per page on the candidates list.
    pub candidates_page_size: Option<u32>,
    /// Rows per page on the jobs list.
    pub jobs_page_size: Option<u32>,
    /// Rows per page on the remaining lists (visitors, referrers, staff).
    pub default_page_size: Option<u32>,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            refetch_timeout_ms: DEFAULT_REFETCH_TIMEOUT_MS,
            event_buffer: DEFAULT_EVENT_BUFFER,
            clients_page_size: None,
            candidates_page_size: None,
            jobs_page_size: None,
            default_page_size: None,
        }
    }
}

impl RealtimeSettings {
    /// Return the refetch timeout.
    pub fn refetch_timeout(&self) -> Duration {
        Duration::from_millis(self.refetch_timeout_ms)
    }

    /// Return the event channel capacity, never less than one.
    pub fn event_buffer(&self) -> usize {
        self.event_buffer.max(1)
    }

    /// Return the page size for the table behind `R`.
    ///
    /// A zero override is ignored in favour of the entity default.
    pub fn page_size_for<R: EntityRecord>(&self) -> PageSize {
        let configured = match R::TABLE {
            "clients" => self.clients_page_size,
            "candidates" => self.candidates_page_size,
            "jobs" => self.jobs_page_size,
            _ => self.default_page_size,
        };
        configured
            .and_then(|size| match PageSize::new(size) {
                Ok(page_size) => Some(page_size),
                Err(error) => {
                    tracing::warn!(table = R::TABLE, %error, "ignoring page size override");
                    None
                }
            })
            .unwrap_or_else(|| default_page_size::<R>())
    }
}

fn default_page_size<R: EntityRecord>() -> PageSize {
    NonZeroU32::new(R::DEFAULT_PAGE_SIZE)
        .map_or(PageSize::from_non_zero(NonZeroU32::MIN), PageSize::from_non_zero)
}
