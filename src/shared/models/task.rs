use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::clock::serialize_timestamp;
use crate::data_access::document::Document;
use crate::task_priority::TaskPriority;
use crate::task_response::TaskResponse;

// Document paths the service addresses directly.
pub const CREATED_AT_PATH: &str = "metadata.created_at";
pub const UPDATED_AT_PATH: &str = "metadata.updated_at";
pub const COMPLETED_PATH: &str = "completed";

/// Store-native identity of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn generate() -> Self {
        TaskId(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(TaskId)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A task as stored in the collection. Identity lives under `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Vec<String>,
    pub priority: TaskPriority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    pub metadata: TaskMetadata,
}

/// Fields of a task that passed validation, before it has an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub image: Vec<String>,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
}

impl Task {
    /// New tasks always start incomplete with both timestamps equal.
    pub fn new(id: TaskId, fields: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            image: fields.image,
            priority: fields.priority,
            tags: fields.tags,
            completed: false,
            metadata: TaskMetadata { created_at: now, updated_at: now },
        }
    }

    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(doc) => Ok(doc),
            _ => Err(serde::ser::Error::custom("task did not serialize to an object")),
        }
    }

    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(doc))
    }

    pub fn to_response(&self) -> TaskResponse {
        TaskResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            priority: self.priority,
            tags: self.tags.clone(),
            completed: self.completed,
            metadata: self.metadata.clone(),
        }
    }
}
