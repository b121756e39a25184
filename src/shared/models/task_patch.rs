//! Sparse task updates.
//!
//! A patch body is an arbitrary JSON object on the wire. It is parsed into a
//! `TaskPatch`: a map from the closed set of updatable fields to values that
//! already passed that field's type and bound checks.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    api_error::ApiError,
    clock::timestamp_value,
    create_task_request::{DESCRIPTION_MAX_CHARS, TAG_MAX_CHARS, TITLE_MAX_CHARS},
    data_access::document::Document,
    task::{Task, UPDATED_AT_PATH},
    task_priority::TaskPriority,
};

/// Keys a patch may never touch. `metadata` is here because replacing it
/// wholesale would rewrite `created_at`.
pub const PROTECTED_FIELDS: [&str; 5] = ["id", "_id", "created_at", "metadata", "metadata.created_at"];

/// Keys the server always overwrites; accepted in a patch but ignored.
pub const SERVER_OWNED_FIELDS: [&str; 2] = ["updated_at", UPDATED_AT_PATH];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatchField {
    Title,
    Description,
    Image,
    Priority,
    Tags,
    Completed,
}

impl PatchField {
    pub const ALL: [PatchField; 6] = [
        PatchField::Title,
        PatchField::Description,
        PatchField::Image,
        PatchField::Priority,
        PatchField::Tags,
        PatchField::Completed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatchField::Title => "title",
            PatchField::Description => "description",
            PatchField::Image => "image",
            PatchField::Priority => "priority",
            PatchField::Tags => "tags",
            PatchField::Completed => "completed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        PatchField::ALL.into_iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(String),
    TextList(Vec<String>),
    Priority(TaskPriority),
    Flag(bool),
}

impl PatchValue {
    pub fn to_json(&self) -> Value {
        match self {
            PatchValue::Text(s) => Value::String(s.clone()),
            PatchValue::TextList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            PatchValue::Priority(p) => Value::String(p.as_str().to_string()),
            PatchValue::Flag(b) => Value::Bool(*b),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    fields: BTreeMap<PatchField, PatchValue>,
}

impl TaskPatch {
    /// Parse a raw JSON object. Checks run in a fixed order: emptiness,
    /// protected keys (all of them reported), `completed`'s type, unknown
    /// keys, then every remaining field's type and bounds.
    pub fn parse(raw: Document) -> Result<Self, ApiError> {
        if raw.is_empty() {
            return Err(ApiError::EmptyPayload);
        }

        let protected: Vec<String> = PROTECTED_FIELDS
            .iter()
            .filter(|key| raw.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !protected.is_empty() {
            return Err(ApiError::ProtectedField(protected));
        }

        if let Some(completed) = raw.get(PatchField::Completed.name()) {
            if !completed.is_boolean() {
                return Err(type_error(PatchField::Completed));
            }
        }

        let unknown: Vec<String> = raw
            .keys()
            .filter(|key| !SERVER_OWNED_FIELDS.contains(&key.as_str()))
            .filter(|key| PatchField::from_name(key).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ApiError::UnknownField(unknown));
        }

        let mut fields = BTreeMap::new();
        for (key, value) in raw {
            if let Some(field) = PatchField::from_name(&key) {
                fields.insert(field, parse_value(field, value)?);
            }
        }
        Ok(TaskPatch { fields })
    }

    pub fn get(&self, field: PatchField) -> Option<&PatchValue> {
        self.fields.get(&field)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The update set sent to the store: every patched field plus a fresh
    /// `metadata.updated_at`.
    pub fn to_update(&self, now: DateTime<Utc>) -> Document {
        let mut set: Document = self
            .fields
            .iter()
            .map(|(field, value)| (field.name().to_string(), value.to_json()))
            .collect();
        set.insert(UPDATED_AT_PATH.to_string(), timestamp_value(now));
        set
    }
}

fn type_error(field: PatchField) -> ApiError {
    let expected = match field {
        PatchField::Title | PatchField::Description | PatchField::Priority => "a string",
        PatchField::Image | PatchField::Tags => "an array of strings",
        PatchField::Completed => "a boolean value",
    };
    ApiError::InvalidFieldType { field: field.name().to_string(), expected }
}

fn string_list(field: PatchField, value: Value) -> Result<Vec<String>, ApiError> {
    let Value::Array(items) = value else {
        return Err(type_error(field));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(type_error(field)),
        })
        .collect()
}

fn parse_value(field: PatchField, value: Value) -> Result<PatchValue, ApiError> {
    match field {
        PatchField::Title => {
            let Value::String(title) = value else { return Err(type_error(field)) };
            let len = title.chars().count();
            if len == 0 || len > TITLE_MAX_CHARS {
                return Err(ApiError::Validation(format!(
                    "Title must be between 1 and {TITLE_MAX_CHARS} characters"
                )));
            }
            Ok(PatchValue::Text(title))
        }
        PatchField::Description => {
            let Value::String(description) = value else { return Err(type_error(field)) };
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(ApiError::Validation(format!(
                    "Description must be at most {DESCRIPTION_MAX_CHARS} characters"
                )));
            }
            Ok(PatchValue::Text(description))
        }
        PatchField::Image => Ok(PatchValue::TextList(string_list(field, value)?)),
        PatchField::Tags => {
            let tags = string_list(field, value)?;
            if let Some(tag) = tags.iter().find(|t| t.chars().count() > TAG_MAX_CHARS) {
                return Err(ApiError::Validation(format!(
                    "Tag '{tag}' must be at most {TAG_MAX_CHARS} characters"
                )));
            }
            Ok(PatchValue::TextList(tags))
        }
        PatchField::Priority => {
            let Value::String(raw) = value else { return Err(type_error(field)) };
            raw.parse()
                .map(PatchValue::Priority)
                .map_err(|e| ApiError::Validation(e.to_string()))
        }
        PatchField::Completed => match value {
            Value::Bool(b) => Ok(PatchValue::Flag(b)),
            _ => Err(type_error(field)),
        },
    }
}

/// Result of a patch whose write went through. If reading the document back
/// failed, only the submitted update set is available.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    FullSuccess(Task),
    PartialSuccess { submitted: Document, warning: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(TaskPatch::parse(Document::new()), Err(ApiError::EmptyPayload)));
    }

    #[test]
    fn protected_fields_win_over_everything_else() {
        let err = TaskPatch::parse(raw(json!({"id": "x"}))).unwrap_err();
        assert!(matches!(err, ApiError::ProtectedField(ref f) if f == &["id"]));

        // Other fields, valid or not, don't change the verdict
        let err = TaskPatch::parse(raw(json!({"id": "x", "title": "ok", "completed": "yes", "bogus": 1})))
            .unwrap_err();
        assert!(matches!(err, ApiError::ProtectedField(_)));
    }

    #[test]
    fn every_protected_field_is_named() {
        let err = TaskPatch::parse(raw(json!({
            "_id": "x",
            "created_at": "2020-01-01T00:00:00Z",
            "metadata.created_at": "2020-01-01T00:00:00Z"
        })))
        .unwrap_err();
        match err {
            ApiError::ProtectedField(fields) => {
                assert_eq!(fields, ["_id", "created_at", "metadata.created_at"]);
            }
            other => panic!("expected ProtectedField, got {other:?}"),
        }
    }

    #[test]
    fn completed_must_be_boolean() {
        let err = TaskPatch::parse(raw(json!({"completed": "yes"}))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidFieldType { ref field, .. } if field == "completed"));

        let patch = TaskPatch::parse(raw(json!({"completed": true}))).unwrap();
        assert_eq!(patch.get(PatchField::Completed), Some(&PatchValue::Flag(true)));
    }

    #[test]
    fn unknown_fields_are_listed() {
        let err = TaskPatch::parse(raw(json!({"title": "t", "colour": "red", "owner": 1}))).unwrap_err();
        match err {
            ApiError::UnknownField(fields) => assert_eq!(fields, ["colour", "owner"]),
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn field_types_and_bounds_are_checked() {
        let cases = [
            (json!({"title": 5}), "type"),
            (json!({"title": ""}), "bounds"),
            (json!({"title": "t".repeat(101)}), "bounds"),
            (json!({"description": "d".repeat(1001)}), "bounds"),
            (json!({"tags": "solo"}), "type"),
            (json!({"tags": ["ok", 3]}), "type"),
            (json!({"tags": ["this-tag-is-far-too-long"]}), "bounds"),
            (json!({"image": [true]}), "type"),
            (json!({"priority": 1}), "type"),
            (json!({"priority": "urgent"}), "bounds"),
        ];
        for (body, kind) in cases {
            let err = TaskPatch::parse(raw(body.clone())).unwrap_err();
            match kind {
                "type" => assert!(matches!(err, ApiError::InvalidFieldType { .. }), "{body}: {err:?}"),
                _ => assert!(matches!(err, ApiError::Validation(_)), "{body}: {err:?}"),
            }
        }
    }

    #[test]
    fn update_set_overwrites_caller_timestamp() {
        let patch = TaskPatch::parse(raw(json!({
            "title": "new",
            "priority": "high",
            "tags": [],
            "updated_at": "1999-01-01T00:00:00Z"
        })))
        .unwrap();
        assert_eq!(patch.field_count(), 3);

        let now = Utc::now();
        let set = patch.to_update(now);
        assert_eq!(set["title"], json!("new"));
        assert_eq!(set["priority"], json!("high"));
        assert_eq!(set["tags"], json!([]));
        assert_eq!(set[UPDATED_AT_PATH], timestamp_value(now));
        assert!(!set.contains_key("updated_at"));
    }
}
