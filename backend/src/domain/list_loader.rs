//! Paged list fetches driven through the [`PageQuery`] port, and detail
//! fetches through the [`RecordRefetcher`] port.

use pagination::{PageNumber, PageRequest};
use tracing::{debug, warn};

use super::ports::{PageQuery, PageQueryError, RecordRefetcher, RefetchError};
use super::records::{EntityRecord, RecordId};
use super::store::CollectionStore;

/// Fetch `page` of the collection into `store`.
///
/// The store is marked loading first. On success rows, total count and
/// current page are replaced together; on failure the message is recorded and
/// the rows already shown are kept. A fetch overtaken by a later call leaves
/// the store to that later call.
///
/// # Errors
/// Returns the query error after recording it on the store.
pub async fn load_page<R: EntityRecord>(
    store: &CollectionStore<R>,
    query: &dyn PageQuery<R>,
    page: PageNumber,
    search: Option<&str>,
) -> Result<(), PageQueryError> {
    let page_size = store.read(|collection| collection.page().page_size());
    let window = PageRequest::new(page, page_size).window();
    let search = search.map(str::trim).filter(|needle| !needle.is_empty());
    let issued = store.begin_load();

    match query.fetch_page(window, search).await {
        Ok(fetched) => {
            debug!(
                table = R::TABLE,
                %page,
                rows = fetched.items.len(),
                total = fetched.total_count,
                "page loaded"
            );
            if !store.finish_load(issued, fetched, page) {
                debug!(table = R::TABLE, %page, "page load superseded; result ignored");
            }
            Ok(())
        }
        Err(error) => {
            warn!(table = R::TABLE, %page, %error, "page load failed");
            if !store.fail_load(issued, error.to_string()) {
                debug!(table = R::TABLE, %page, "page load superseded; failure ignored");
            }
            Err(error)
        }
    }
}

/// Fetch the full record `id` into the store's detail slot.
///
/// Returns whether the record exists. A missing record is recorded as a
/// failed detail load.
///
/// # Errors
/// Returns the refetch error after recording it on the store.
pub async fn load_record<R: EntityRecord>(
    store: &CollectionStore<R>,
    refetcher: &dyn RecordRefetcher<R>,
    id: &RecordId,
) -> Result<bool, RefetchError> {
    let issued = store.begin_detail();
    match refetcher.refetch(id).await {
        Ok(Some(record)) => {
            store.finish_detail(issued, record);
            Ok(true)
        }
        Ok(None) => {
            debug!(table = R::TABLE, %id, "detail record not found");
            store.fail_detail(issued, format!("record {id} not found"));
            Ok(false)
        }
        Err(error) => {
            warn!(table = R::TABLE, %id, %error, "detail load failed");
            store.fail_detail(issued, error.to_string());
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::{EntityCollection, LoadStatus};
    use crate::domain::ports::FetchedPage;
    use crate::domain::{Client, RecordId};
    use crate::test_support::{ScriptedRefetcher, client};
    use async_trait::async_trait;
    use pagination::{PageSize, RowWindow};
    use rstest::{fixture, rstest};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQuery {
        requests: Mutex<Vec<(RowWindow, Option<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl PageQuery<Client> for RecordingQuery {
        async fn fetch_page(
            &self,
            window: RowWindow,
            search: Option<&str>,
        ) -> Result<FetchedPage<Client>, PageQueryError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push((window, search.map(str::to_owned)));
            if self.fail {
                return Err(PageQueryError::backend("timeout"));
            }
            Ok(FetchedPage {
                items: vec![client(31, "Row 31"), client(30, "Row 30")],
                total_count: 32,
            })
        }
    }

    /// Starts a newer load on the same store while its own fetch is out.
    struct OvertakenQuery {
        store: CollectionStore<Client>,
    }

    #[async_trait]
    impl PageQuery<Client> for OvertakenQuery {
        async fn fetch_page(
            &self,
            _window: RowWindow,
            _search: Option<&str>,
        ) -> Result<FetchedPage<Client>, PageQueryError> {
            self.store.begin_load();
            Ok(FetchedPage {
                items: vec![client(1, "Outdated")],
                total_count: 1,
            })
        }
    }

    #[fixture]
    fn store() -> CollectionStore<Client> {
        CollectionStore::new(PageSize::new(15).expect("valid size"))
    }

    #[rstest]
    #[tokio::test]
    async fn requests_the_page_window_and_applies_rows(store: CollectionStore<Client>) {
        let query = RecordingQuery::default();
        let page = PageNumber::new(3).expect("valid page");

        load_page(&store, &query, page, Some("  row ")).await.expect("page loads");

        let requests = query.requests.lock().expect("requests lock").clone();
        assert_eq!(
            requests,
            [(RowWindow { from: 30, to: 44 }, Some("row".to_owned()))]
        );
        let summary = store.read(|c| c.summary());
        assert_eq!((summary.current_page, summary.total_pages), (3, 3));
        assert!(store.read(|c| c.contains(&RecordId::from(31))));
        assert_eq!(store.read(|c| c.status().clone()), LoadStatus::Succeeded);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_search_is_not_sent(store: CollectionStore<Client>) {
        let query = RecordingQuery::default();

        load_page(&store, &query, PageNumber::FIRST, Some("   "))
            .await
            .expect("page loads");

        let requests = query.requests.lock().expect("requests lock").clone();
        assert_eq!(requests.first().and_then(|(_, search)| search.clone()), None);
    }

    #[rstest]
    #[tokio::test]
    async fn failure_is_recorded_and_rows_kept(store: CollectionStore<Client>) {
        store.record_created(client(1, "Kept"));
        let query = RecordingQuery {
            fail: true,
            ..RecordingQuery::default()
        };

        let error = load_page(&store, &query, PageNumber::FIRST, None)
            .await
            .expect_err("query fails");

        assert_eq!(error, PageQueryError::backend("timeout"));
        assert_eq!(
            store.read(|c| c.status().clone()),
            LoadStatus::Failed {
                message: "page query failed: timeout".into()
            }
        );
        assert_eq!(store.read(|c| c.len()), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn overtaken_load_leaves_the_store_to_the_newer_one(store: CollectionStore<Client>) {
        let query = OvertakenQuery {
            store: store.clone(),
        };

        load_page(&store, &query, PageNumber::FIRST, None)
            .await
            .expect("fetch itself succeeds");

        assert!(store.read(EntityCollection::is_empty));
        assert_eq!(store.read(|c| c.status().clone()), LoadStatus::Loading);
    }

    #[rstest]
    #[tokio::test]
    async fn detail_load_shows_the_full_record(store: CollectionStore<Client>) {
        let refetcher = ScriptedRefetcher::default().with_row(client(4, "Acme in full"));

        let found = load_record(&store, &refetcher, &RecordId::from(4))
            .await
            .expect("refetch succeeds");

        assert!(found);
        assert_eq!(
            store.read(|c| c.detail().map(|row| row.company_name.clone())),
            Some("Acme in full".to_owned())
        );
        assert_eq!(store.read(|c| c.detail_status().clone()), LoadStatus::Succeeded);
        assert!(store.read(EntityCollection::is_empty));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_detail_record_is_a_failed_load(store: CollectionStore<Client>) {
        let refetcher = ScriptedRefetcher::<Client>::default();

        let found = load_record(&store, &refetcher, &RecordId::from(9))
            .await
            .expect("refetch succeeds");

        assert!(!found);
        assert_eq!(
            store.read(|c| c.detail_status().clone()),
            LoadStatus::Failed {
                message: "record 9 not found".to_owned()
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn detail_refetch_error_is_recorded(store: CollectionStore<Client>) {
        let refetcher = ScriptedRefetcher::<Client>::default()
            .with_failure(RecordId::from(5), RefetchError::backend("connection reset"));

        let error = load_record(&store, &refetcher, &RecordId::from(5))
            .await
            .expect_err("refetch fails");

        assert_eq!(error, RefetchError::backend("connection reset"));
        assert!(matches!(
            store.read(|c| c.detail_status().clone()),
            LoadStatus::Failed { .. }
        ));
    }
}
