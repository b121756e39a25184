//! redb-backed document store.
//!
//! One redb table per collection. Keys are `_id` strings, values are the
//! document serialized as JSON. redb calls block, so every collection call
//! runs on the blocking pool under the caller's deadline.

use crate::data_access::collection::{Deadline, DocumentCollection};
use crate::data_access::document::{
    apply_set, DeleteResult, Document, Filter, FindOptions, InsertOneResult, ReturnDocument,
    UpdateResult, ID_FIELD,
};
use crate::data_access::store_error::StoreError;
use async_trait::async_trait;
use redb::{backends::InMemoryBackend, Database, ReadableTable, TableDefinition};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

fn table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// Handle to the database file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct DataContext {
    db: Arc<Database>,
}

impl DataContext {
    /// Open (or create) the database at the given path.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        tracing::info!(path, "document store opened");
        Ok(DataContext { db: Arc::new(db) })
    }

    /// A throwaway store that lives in memory. Used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Ok(DataContext { db: Arc::new(db) })
    }

    /// Get a collection handle, creating its table if it doesn't exist yet.
    pub fn collection(&self, name: &str) -> Result<RedbCollection, StoreError> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(table(name))?;
        }
        txn.commit()?;
        Ok(RedbCollection { db: self.db.clone(), name: Arc::from(name) })
    }

    /// Release the database. If collection handles are still alive the file
    /// stays open until the last of them drops.
    pub fn close(self) {
        match Arc::try_unwrap(self.db) {
            Ok(db) => {
                drop(db);
                tracing::info!("document store closed");
            }
            Err(db) => {
                tracing::warn!(
                    handles = Arc::strong_count(&db) - 1,
                    "document store still referenced, closing when the last handle drops"
                );
            }
        }
    }
}

// ── Collection ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedbCollection {
    db: Arc<Database>,
    name: Arc<str>,
}

impl RedbCollection {
    /// Run `work` on the blocking pool, bounded by `deadline`.
    async fn blocking<T, F>(&self, deadline: Deadline, op: &'static str, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &str) -> Result<T, StoreError> + Send + 'static,
    {
        let db = self.db.clone();
        let name = self.name.clone();
        let start = std::time::Instant::now();

        let result = deadline
            .run(async move { tokio::task::spawn_blocking(move || work(db.as_ref(), name.as_ref())).await? })
            .await;

        #[cfg(feature = "profile")]
        tracing::debug!(
            collection = %self.name,
            op,
            elapsed_us = start.elapsed().as_micros() as u64,
            ok = result.is_ok(),
            "store call timed"
        );
        #[cfg(not(feature = "profile"))]
        tracing::trace!(collection = %self.name, op, ok = result.is_ok(), elapsed = ?start.elapsed(), "store call");

        result
    }
}

#[async_trait]
impl DocumentCollection for RedbCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self, deadline: Deadline) -> Result<(), StoreError> {
        self.blocking(deadline, "ping", |db, name| {
            let txn = db.begin_read()?;
            let _ = txn.open_table(table(name))?;
            Ok(())
        })
        .await
    }

    async fn insert_one(
        &self,
        deadline: Deadline,
        mut doc: Document,
    ) -> Result<InsertOneResult, StoreError> {
        let id = match doc.get(ID_FIELD) {
            None => {
                let id = Uuid::new_v4().to_string();
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::Encode(format!("_id must be a string, got {other}")))
            }
        };
        let bytes = encode(&doc)?;

        self.blocking(deadline, "insert_one", move |db, name| {
            let txn = db.begin_write()?;
            {
                let mut docs = txn.open_table(table(name))?;
                let taken = docs.get(id.as_str())?.is_some();
                if taken {
                    return Err(StoreError::DuplicateKey(id));
                }
                docs.insert(id.as_str(), bytes.as_slice())?;
            }
            txn.commit()?;
            Ok(InsertOneResult { inserted_id: id })
        })
        .await
    }

    async fn find(
        &self,
        deadline: Deadline,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.blocking(deadline, "find", move |db, name| {
            let txn = db.begin_read()?;
            let docs = txn.open_table(table(name))?;
            let mut found = all_matches(&docs, &filter)?;

            if let Some(sort) = &options.sort {
                found.sort_by(|a, b| sort.compare(a, b));
            }

            let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
            let limit = options
                .limit
                .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
                .unwrap_or(usize::MAX);
            Ok(found.into_iter().skip(skip).take(limit).collect())
        })
        .await
    }

    async fn count_documents(&self, deadline: Deadline, filter: Filter) -> Result<u64, StoreError> {
        self.blocking(deadline, "count_documents", move |db, name| {
            let txn = db.begin_read()?;
            let docs = txn.open_table(table(name))?;
            Ok(all_matches(&docs, &filter)?.len() as u64)
        })
        .await
    }

    async fn find_one(
        &self,
        deadline: Deadline,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.blocking(deadline, "find_one", move |db, name| {
            let txn = db.begin_read()?;
            let docs = txn.open_table(table(name))?;
            Ok(first_match(&docs, &filter)?.map(|(_, doc)| doc))
        })
        .await
    }

    async fn update_one(
        &self,
        deadline: Deadline,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        guard_identity(&set)?;
        self.blocking(deadline, "update_one", move |db, name| {
            let txn = db.begin_write()?;
            let result = {
                let mut docs = txn.open_table(table(name))?;
                match first_match(&docs, &filter)? {
                    None => UpdateResult { matched_count: 0, modified_count: 0 },
                    Some((key, mut doc)) => {
                        let modified = apply_set(&mut doc, &set);
                        if modified {
                            docs.insert(key.as_str(), encode(&doc)?.as_slice())?;
                        }
                        UpdateResult { matched_count: 1, modified_count: u64::from(modified) }
                    }
                }
            };
            txn.commit()?;
            Ok(result)
        })
        .await
    }

    async fn find_one_and_update(
        &self,
        deadline: Deadline,
        filter: Filter,
        set: Document,
        return_document: ReturnDocument,
    ) -> Result<Option<Document>, StoreError> {
        guard_identity(&set)?;
        self.blocking(deadline, "find_one_and_update", move |db, name| {
            let txn = db.begin_write()?;
            let returned = {
                let mut docs = txn.open_table(table(name))?;
                match first_match(&docs, &filter)? {
                    None => None,
                    Some((key, before)) => {
                        let mut after = before.clone();
                        if apply_set(&mut after, &set) {
                            docs.insert(key.as_str(), encode(&after)?.as_slice())?;
                        }
                        Some(match return_document {
                            ReturnDocument::Before => before,
                            ReturnDocument::After => after,
                        })
                    }
                }
            };
            txn.commit()?;
            Ok(returned)
        })
        .await
    }

    async fn delete_one(
        &self,
        deadline: Deadline,
        filter: Filter,
    ) -> Result<DeleteResult, StoreError> {
        self.blocking(deadline, "delete_one", move |db, name| {
            let txn = db.begin_write()?;
            let deleted_count = {
                let mut docs = txn.open_table(table(name))?;
                match first_match(&docs, &filter)? {
                    None => 0,
                    Some((key, _)) => u64::from(docs.remove(key.as_str())?.is_some()),
                }
            };
            txn.commit()?;
            Ok(DeleteResult { deleted_count })
        })
        .await
    }
}

// ── Helpers ────────────────────────────────────────────────────

fn encode(doc: &Document) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(doc).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

/// `_id` is immutable once a document exists.
fn guard_identity(set: &Document) -> Result<(), StoreError> {
    if set.contains_key(ID_FIELD) {
        return Err(StoreError::Encode("_id cannot be modified".to_string()));
    }
    Ok(())
}

fn first_match<T>(docs: &T, filter: &Filter) -> Result<Option<(String, Document)>, StoreError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    if let Some(id) = filter.id() {
        return match docs.get(id)? {
            Some(bytes) => Ok(Some((id.to_string(), decode(bytes.value())?))),
            None => Ok(None),
        };
    }

    for entry in docs.iter()? {
        let (key, value) = entry?;
        let doc = decode(value.value())?;
        if filter.matches(&doc) {
            return Ok(Some((key.value().to_string(), doc)));
        }
    }
    Ok(None)
}

fn all_matches<T>(docs: &T, filter: &Filter) -> Result<Vec<Document>, StoreError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    if filter.id().is_some() {
        return Ok(first_match(docs, filter)?.map(|(_, doc)| doc).into_iter().collect());
    }

    let mut found = Vec::new();
    for entry in docs.iter()? {
        let (_, value) = entry?;
        let doc = decode(value.value())?;
        if filter.matches(&doc) {
            found.push(doc);
        }
    }
    Ok(found)
}

// ── Tests ──────────────────────────────────────────────────────
