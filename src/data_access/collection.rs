//! The connector seam: what handlers may ask of a document collection.

use crate::data_access::document::{
    DeleteResult, Document, Filter, FindOptions, InsertOneResult, ReturnDocument, UpdateResult,
};
use crate::data_access::store_error::StoreError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which a store call is abandoned.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Deadline { expires_at: Instant::now() + budget, budget }
    }

    /// Drive `fut` until it finishes or the deadline passes.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout_at(self.expires_at, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.budget))?
    }
}

/// A named set of documents addressed by `_id`.
///
/// Implementations must be safe to share across requests; callers add no locking.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap round trip proving the store is reachable.
    async fn ping(&self, deadline: Deadline) -> Result<(), StoreError>;

    /// Insert a new document. A missing `_id` is generated; a taken one is rejected.
    async fn insert_one(
        &self,
        deadline: Deadline,
        doc: Document,
    ) -> Result<InsertOneResult, StoreError>;

    async fn find(
        &self,
        deadline: Deadline,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count_documents(&self, deadline: Deadline, filter: Filter) -> Result<u64, StoreError>;

    async fn find_one(
        &self,
        deadline: Deadline,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Merge `set` (dotted paths allowed) into the first matching document.
    async fn update_one(
        &self,
        deadline: Deadline,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError>;

    /// Like `update_one`, returning the matched document (`None` when nothing matched).
    async fn find_one_and_update(
        &self,
        deadline: Deadline,
        filter: Filter,
        set: Document,
        return_document: ReturnDocument,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete_one(&self, deadline: Deadline, filter: Filter)
        -> Result<DeleteResult, StoreError>;
}
