//! Mock repository implementations for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::page::PageSnapshot;
use crate::domain::query::QueryIntent;
use crate::domain::record::Record;
use crate::domain::types::RecordId;
use crate::repository::errors::RepositoryResult;
use crate::repository::{RecordReader, RecordWriter};

mock! {
    pub Repository {}

    #[async_trait]
    impl RecordReader for Repository {
        async fn fetch_page(&self, query: QueryIntent) -> RepositoryResult<PageSnapshot>;
    }

    #[async_trait]
    impl RecordWriter for Repository {
        async fn save(&self, record: Record) -> RepositoryResult<Option<Record>>;
        async fn delete(&self, id: RecordId) -> RepositoryResult<()>;
    }
}
