//! In-process row table serving refetches and paged queries.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use pagination::RowWindow;

use crate::domain::ports::{
    FetchedPage, PageQuery, PageQueryError, RecordRefetcher, RefetchError,
};
use crate::domain::{EntityRecord, RecordId};

/// Rows of one table, newest first.
pub struct InMemoryTable<R> {
    rows: RwLock<Vec<R>>,
}

impl<R: EntityRecord> Default for InMemoryTable<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<R: EntityRecord> InMemoryTable<R> {
    /// Table holding `rows`, which are taken to be newest first.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<R>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<R>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace `row`; new rows go first.
    pub fn upsert(&self, row: R) {
        let mut rows = self.write();
        match rows.iter_mut().find(|existing| existing.id() == row.id()) {
            Some(existing) => *existing = row,
            None => rows.insert(0, row),
        }
    }

    /// Remove row `id`, returning whether it existed.
    pub fn delete(&self, id: &RecordId) -> bool {
        let mut rows = self.write();
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        rows.len() != before
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[async_trait]
impl<R: EntityRecord> RecordRefetcher<R> for InMemoryTable<R> {
    async fn refetch(&self, id: &RecordId) -> Result<Option<R>, RefetchError> {
        Ok(self.read().iter().find(|row| row.id() == id).cloned())
    }
}

#[async_trait]
impl<R: EntityRecord> PageQuery<R> for InMemoryTable<R> {
    async fn fetch_page(
        &self,
        window: RowWindow,
        search: Option<&str>,
    ) -> Result<FetchedPage<R>, PageQueryError> {
        let rows = self.read();
        let matching: Vec<&R> = rows
            .iter()
            .filter(|row| search.is_none_or(|needle| row.matches_search(needle)))
            .collect();
        let total_count = u64::try_from(matching.len())
            .map_err(|error| PageQueryError::backend(error.to_string()))?;
        let skip = usize::try_from(window.from).unwrap_or(usize::MAX);
        let take = usize::try_from(window.len()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect();
        Ok(FetchedPage { items, total_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Client;
    use crate::test_support::client;
    use rstest::{fixture, rstest};

    #[fixture]
    fn table() -> InMemoryTable<Client> {
        InMemoryTable::new(
            (1..=7)
                .rev()
                .map(|id| client(id, &format!("Company {id}")))
                .collect(),
        )
    }

    fn ids(page: &FetchedPage<Client>) -> Vec<String> {
        page.items.iter().map(|row| row.id.to_string()).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn pages_slice_the_newest_first_rows(table: InMemoryTable<Client>) {
        let second = table
            .fetch_page(RowWindow { from: 3, to: 5 }, None)
            .await
            .expect("page");
        assert_eq!(ids(&second), ["4", "3", "2"]);
        assert_eq!(second.total_count, 7);

        let tail = table
            .fetch_page(RowWindow { from: 6, to: 8 }, None)
            .await
            .expect("page");
        assert_eq!(ids(&tail), ["1"]);
    }

    #[rstest]
    #[tokio::test]
    async fn search_filters_before_counting(table: InMemoryTable<Client>) {
        let page = table
            .fetch_page(RowWindow { from: 0, to: 9 }, Some("company 5"))
            .await
            .expect("page");
        assert_eq!(ids(&page), ["5"]);
        assert_eq!(page.total_count, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn refetch_reflects_current_rows(table: InMemoryTable<Client>) {
        table.upsert(client(3, "Renamed"));
        assert!(table.delete(&RecordId::from(4)));
        assert!(!table.delete(&RecordId::from(4)));

        let renamed = table.refetch(&RecordId::from(3)).await.expect("refetch");
        assert_eq!(renamed.map(|row| row.company_name), Some("Renamed".to_owned()));
        assert_eq!(table.refetch(&RecordId::from(4)).await.expect("refetch"), None);
        assert_eq!(table.len(), 6);
    }
}
