//! Document model shared by every collection implementation.
//!
//! A document is a JSON object. Field paths may be dotted (`metadata.updated_at`)
//! to reach into nested objects, both in filters and in update sets.

use chrono::DateTime;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub type Document = Map<String, Value>;

/// Key holding a document's identity.
pub const ID_FIELD: &str = "_id";

// ── Filters ────────────────────────────────────────────────────

/// Equality predicates over field paths, all of which must hold.
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: BTreeMap<String, Value>,
}

impl Filter {
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::all().and(path, value)
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Filter::eq(ID_FIELD, Value::String(id.into()))
    }

    pub fn and(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.insert(path.into(), value.into());
        self
    }

    /// The identity this filter pins down, when it is a pure `_id` lookup.
    /// Collections use it to skip the scan.
    pub fn id(&self) -> Option<&str> {
        if self.predicates.len() != 1 {
            return None;
        }
        self.predicates.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates
            .iter()
            .all(|(path, expected)| get_path(doc, path) == Some(expected))
    }
}

// ── Query options and results ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub path: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(path: impl Into<String>) -> Self {
        Sort { path: path.into(), direction: SortDirection::Ascending }
    }

    pub fn descending(path: impl Into<String>) -> Self {
        Sort { path: path.into(), direction: SortDirection::Descending }
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(get_path(a, &self.path), get_path(b, &self.path));
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: Option<u64>,
    pub sort: Option<Sort>,
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions::default()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Which version of the document `find_one_and_update` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    #[default]
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOneResult {
    pub inserted_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

// ── Path helpers ───────────────────────────────────────────────

pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => doc.get(path),
        Some((head, rest)) => match doc.get(head)? {
            Value::Object(child) => get_path(child, rest),
            _ => None,
        },
    }
}

/// Write `value` at `path`, creating (or replacing non-object) intermediates.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                set_path(map, rest, value);
            }
        }
    }
}

/// Merge-patch: overwrite every path named in `set`, leave the rest alone.
/// Returns whether anything actually changed.
pub fn apply_set(doc: &mut Document, set: &Document) -> bool {
    let mut changed = false;
    for (path, value) in set {
        if get_path(doc, path) != Some(value) {
            changed = true;
            set_path(doc, path, value.clone());
        }
    }
    changed
}

/// Total order used for sorting. Missing fields sort first; RFC 3339 strings
/// compare chronologically so fractional-second precision doesn't matter.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

// ── Tests ──────────────────────────────────────────────────────
