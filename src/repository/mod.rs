use async_trait::async_trait;

use crate::domain::page::PageSnapshot;
use crate::domain::query::QueryIntent;
use crate::domain::record::Record;
use crate::domain::types::RecordId;
use crate::repository::errors::RepositoryResult;

pub mod endpoint_store;
pub mod errors;
pub mod http;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

pub use endpoint_store::{EndpointStore, FileEndpointStore, MemoryEndpointStore};
pub use http::HttpRepository;

/// Which kind of write a save performs. Resolved endpoints are cached per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Create,
    Update,
}

impl WriteKind {
    pub fn of(record: &Record) -> Self {
        if record.is_new() {
            WriteKind::Create
        } else {
            WriteKind::Update
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WriteKind::Create => "create",
            WriteKind::Update => "update",
        }
    }
}

#[async_trait]
pub trait RecordReader: Send + Sync {
    async fn fetch_page(&self, query: QueryIntent) -> RepositoryResult<PageSnapshot>;
}

#[async_trait]
pub trait RecordWriter: Send + Sync {
    /// Creates the record when it has no id, updates it otherwise. Returns the
    /// persisted record when the backend sends one back.
    async fn save(&self, record: Record) -> RepositoryResult<Option<Record>>;
    async fn delete(&self, id: RecordId) -> RepositoryResult<()>;
}
