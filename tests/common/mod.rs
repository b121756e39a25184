//! Shared helpers for the HTTP integration tests.
//!
//! Each test file is its own crate, so helpers used by only some of them
//! would otherwise warn as dead code.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use todo_server::{
    app_state::AppState,
    data_access::{
        collection::{Deadline, DocumentCollection},
        data_context::{DataContext, RedbCollection},
        document::{
            DeleteResult, Document, Filter, FindOptions, InsertOneResult, ReturnDocument,
            UpdateResult,
        },
        store_error::StoreError,
    },
    map_routes,
    settings::Timeouts,
};

// =============================================================================
// App builders
// =============================================================================

pub fn in_memory_collection() -> RedbCollection {
    DataContext::in_memory()
        .and_then(|context| context.collection("tasks"))
        .expect("in-memory store")
}

pub fn app_with(collection: Arc<dyn DocumentCollection>, timeouts: Timeouts) -> Router {
    map_routes(Arc::new(AppState::new(collection, timeouts)))
}

pub fn app() -> Router {
    app_with(Arc::new(in_memory_collection()), Timeouts::default())
}

// =============================================================================
// Requests
// =============================================================================

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    read(app.clone().oneshot(request).await.unwrap()).await
}

pub async fn send_raw(app: &Router, method: Method, uri: &str, raw: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();
    read(app.clone().oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub fn task_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "B",
        "image": ["y"],
        "priority": "low",
        "tags": ["x"]
    })
}

/// Create a task through the API and return its id.
pub async fn create_task(app: &Router, title: &str) -> String {
    let (status, body) = send(app, Method::POST, "/tasks", Some(task_body(title))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Collection doubles
// =============================================================================

/// Every call fails the way an unreachable store would.
pub struct FailingCollection;

fn refused() -> StoreError {
    StoreError::Driver("connection refused".into())
}

#[async_trait]
impl DocumentCollection for FailingCollection {
    fn name(&self) -> &str {
        "failing"
    }

    async fn ping(&self, _: Deadline) -> Result<(), StoreError> {
        Err(refused())
    }

    async fn insert_one(&self, _: Deadline, _: Document) -> Result<InsertOneResult, StoreError> {
        Err(refused())
    }

    async fn find(&self, _: Deadline, _: Filter, _: FindOptions) -> Result<Vec<Document>, StoreError> {
        Err(refused())
    }

    async fn count_documents(&self, _: Deadline, _: Filter) -> Result<u64, StoreError> {
        Err(refused())
    }

    async fn find_one(&self, _: Deadline, _: Filter) -> Result<Option<Document>, StoreError> {
        Err(refused())
    }

    async fn update_one(&self, _: Deadline, _: Filter, _: Document) -> Result<UpdateResult, StoreError> {
        Err(refused())
    }

    async fn find_one_and_update(
        &self,
        _: Deadline,
        _: Filter,
        _: Document,
        _: ReturnDocument,
    ) -> Result<Option<Document>, StoreError> {
        Err(refused())
    }

    async fn delete_one(&self, _: Deadline, _: Filter) -> Result<DeleteResult, StoreError> {
        Err(refused())
    }
}

/// Every call hangs well past any deadline a test configures.
pub struct SlowCollection;

async fn hang<T>(deadline: Deadline) -> Result<T, StoreError> {
    deadline
        .run(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(refused())
        })
        .await
}

#[async_trait]
impl DocumentCollection for SlowCollection {
    fn name(&self) -> &str {
        "slow"
    }

    async fn ping(&self, deadline: Deadline) -> Result<(), StoreError> {
        hang(deadline).await
    }

    async fn insert_one(&self, deadline: Deadline, _: Document) -> Result<InsertOneResult, StoreError> {
        hang(deadline).await
    }

    async fn find(&self, deadline: Deadline, _: Filter, _: FindOptions) -> Result<Vec<Document>, StoreError> {
        hang(deadline).await
    }

    async fn count_documents(&self, deadline: Deadline, _: Filter) -> Result<u64, StoreError> {
        hang(deadline).await
    }

    async fn find_one(&self, deadline: Deadline, _: Filter) -> Result<Option<Document>, StoreError> {
        hang(deadline).await
    }

    async fn update_one(&self, deadline: Deadline, _: Filter, _: Document) -> Result<UpdateResult, StoreError> {
        hang(deadline).await
    }

    async fn find_one_and_update(
        &self,
        deadline: Deadline,
        _: Filter,
        _: Document,
        _: ReturnDocument,
    ) -> Result<Option<Document>, StoreError> {
        hang(deadline).await
    }

    async fn delete_one(&self, deadline: Deadline, _: Filter) -> Result<DeleteResult, StoreError> {
        hang(deadline).await
    }
}

pub fn short_timeouts() -> Timeouts {
    Timeouts { insert: Duration::from_millis(50), operation: Duration::from_millis(50) }
}

/// A working store whose single-document reads fail, so writes land but
/// cannot be read back.
pub struct UnreadableCollection {
    pub inner: RedbCollection,
}

#[async_trait]
impl DocumentCollection for UnreadableCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn ping(&self, deadline: Deadline) -> Result<(), StoreError> {
        self.inner.ping(deadline).await
    }

    async fn insert_one(&self, deadline: Deadline, doc: Document) -> Result<InsertOneResult, StoreError> {
        self.inner.insert_one(deadline, doc).await
    }

    async fn find(&self, deadline: Deadline, filter: Filter, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        self.inner.find(deadline, filter, options).await
    }

    async fn count_documents(&self, deadline: Deadline, filter: Filter) -> Result<u64, StoreError> {
        self.inner.count_documents(deadline, filter).await
    }

    async fn find_one(&self, _: Deadline, _: Filter) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Decode("read failed".into()))
    }

    async fn update_one(&self, deadline: Deadline, filter: Filter, set: Document) -> Result<UpdateResult, StoreError> {
        self.inner.update_one(deadline, filter, set).await
    }

    async fn find_one_and_update(
        &self,
        deadline: Deadline,
        filter: Filter,
        set: Document,
        return_document: ReturnDocument,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.find_one_and_update(deadline, filter, set, return_document).await
    }

    async fn delete_one(&self, deadline: Deadline, filter: Filter) -> Result<DeleteResult, StoreError> {
        self.inner.delete_one(deadline, filter).await
    }
}

/// A working store where the document disappears between a toggle's read and
/// its write.
pub struct VanishingCollection {
    pub inner: RedbCollection,
}

#[async_trait]
impl DocumentCollection for VanishingCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn ping(&self, deadline: Deadline) -> Result<(), StoreError> {
        self.inner.ping(deadline).await
    }

    async fn insert_one(&self, deadline: Deadline, doc: Document) -> Result<InsertOneResult, StoreError> {
        self.inner.insert_one(deadline, doc).await
    }

    async fn find(&self, deadline: Deadline, filter: Filter, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        self.inner.find(deadline, filter, options).await
    }

    async fn count_documents(&self, deadline: Deadline, filter: Filter) -> Result<u64, StoreError> {
        self.inner.count_documents(deadline, filter).await
    }

    async fn find_one(&self, deadline: Deadline, filter: Filter) -> Result<Option<Document>, StoreError> {
        self.inner.find_one(deadline, filter).await
    }

    async fn update_one(&self, deadline: Deadline, filter: Filter, set: Document) -> Result<UpdateResult, StoreError> {
        self.inner.update_one(deadline, filter, set).await
    }

    async fn find_one_and_update(
        &self,
        deadline: Deadline,
        filter: Filter,
        _: Document,
        _: ReturnDocument,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.delete_one(deadline, filter).await?;
        Ok(None)
    }

    async fn delete_one(&self, deadline: Deadline, filter: Filter) -> Result<DeleteResult, StoreError> {
        self.inner.delete_one(deadline, filter).await
    }
}
