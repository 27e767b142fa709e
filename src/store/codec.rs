//! Typed-value document encoding used by the remote document store.
//!
//! Every field is an object with a single key naming its type, e.g.
//! `{"stringValue": "Buy milk"}` or `{"booleanValue": true}`. Dates are kept
//! as ISO-8601 strings, the way tasks have always been written.

use super::StoreError;
use crate::domain::{Category, NewTask, Priority, Task, TaskPatch};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// A stored document as returned by the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// Last path segment of the document name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// One row of a query response; rows without a document mark an empty result
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRow {
    #[serde(default)]
    pub document: Option<Document>,
}

/// The field types tasks use
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => json!({ "stringValue": s }),
            Self::Boolean(b) => json!({ "booleanValue": b }),
            Self::Timestamp(t) => json!({ "timestampValue": format_date(t) }),
            Self::Null => json!({ "nullValue": null }),
        }
    }

    /// Decode a typed value. Types tasks never use yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let (kind, inner) = object.iter().next()?;
        match kind.as_str() {
            "stringValue" => inner.as_str().map(|s| Self::String(s.to_string())),
            "booleanValue" => inner.as_bool().map(Self::Boolean),
            "timestampValue" => inner.as_str().and_then(parse_date).map(Self::Timestamp),
            "nullValue" => Some(Self::Null),
            _ => None,
        }
    }
}

/// ISO-8601 with milliseconds and a `Z` suffix
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn string_field(value: &str) -> Value {
    FieldValue::String(value.to_string()).to_json()
}

fn date_field(date: &DateTime<Utc>) -> Value {
    FieldValue::String(format_date(date)).to_json()
}

/// Field map for a task that has not been stored yet
pub fn encode_new_task(task: &NewTask) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("userId".into(), string_field(&task.owner_id));
    fields.insert("title".into(), string_field(&task.title));
    fields.insert("description".into(), string_field(&task.description));
    fields.insert("subtask".into(), string_field(&task.subtask));
    fields.insert("priority".into(), string_field(task.priority.name()));
    fields.insert("category".into(), string_field(task.category.name()));
    fields.insert("dueDate".into(), date_field(&task.due_date));
    fields.insert("reminder".into(), date_field(&task.reminder));
    fields.insert("completed".into(), FieldValue::Boolean(false).to_json());
    fields.insert("createdAt".into(), date_field(&task.created_at));
    fields
}

/// Field map and update mask for a patch. Fields named in the mask but
/// absent from the map are removed by the store (`completedAt` on reopen).
pub fn encode_patch(patch: &TaskPatch) -> (Map<String, Value>, Vec<&'static str>) {
    let mut fields = Map::new();
    if let Some(title) = &patch.title {
        fields.insert("title".into(), string_field(title));
    }
    if let Some(description) = &patch.description {
        fields.insert("description".into(), string_field(description));
    }
    if let Some(subtask) = &patch.subtask {
        fields.insert("subtask".into(), string_field(subtask));
    }
    if let Some(priority) = patch.priority {
        fields.insert("priority".into(), string_field(priority.name()));
    }
    if let Some(category) = patch.category {
        fields.insert("category".into(), string_field(category.name()));
    }
    if let Some(due_date) = &patch.due_date {
        fields.insert("dueDate".into(), date_field(due_date));
    }
    if let Some(reminder) = &patch.reminder {
        fields.insert("reminder".into(), date_field(reminder));
    }
    if let Some(completed) = patch.completed {
        fields.insert("completed".into(), FieldValue::Boolean(completed).to_json());
        if let (true, Some(at)) = (completed, &patch.completed_at) {
            fields.insert("completedAt".into(), date_field(at));
        }
    }
    (fields, patch.field_paths())
}

fn field(doc: &Document, key: &str) -> Option<FieldValue> {
    doc.fields.get(key).and_then(FieldValue::from_json)
}

fn text(doc: &Document, key: &str) -> Option<String> {
    match field(doc, key)? {
        FieldValue::String(s) => Some(s),
        _ => None,
    }
}

fn date(doc: &Document, key: &str) -> Option<DateTime<Utc>> {
    match field(doc, key)? {
        FieldValue::String(s) => parse_date(&s),
        FieldValue::Timestamp(t) => Some(t),
        _ => None,
    }
}

fn required<T>(value: Option<T>, doc: &Document, key: &str) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::Decode(format!("document {} has no valid {}", doc.id(), key)))
}

/// Decode a stored task document
pub fn decode_task(doc: &Document) -> Result<Task, StoreError> {
    let owner_id = required(text(doc, "userId"), doc, "userId")?;
    let title = required(text(doc, "title"), doc, "title")?;
    let due_date = required(date(doc, "dueDate"), doc, "dueDate")?;

    let priority = match text(doc, "priority") {
        Some(name) => Priority::from_name(&name).unwrap_or_else(|| {
            warn!(task_id = doc.id(), priority = %name, "unknown priority, using default");
            Priority::default()
        }),
        None => Priority::default(),
    };
    let category = match text(doc, "category") {
        Some(name) => Category::from_name(&name).unwrap_or_else(|| {
            warn!(task_id = doc.id(), category = %name, "unknown category, using default");
            Category::default()
        }),
        None => Category::default(),
    };

    let completed = matches!(field(doc, "completed"), Some(FieldValue::Boolean(true)));
    let completed_at = if completed { date(doc, "completedAt") } else { None };

    Ok(Task {
        id: doc.id().to_string(),
        owner_id,
        title,
        description: text(doc, "description").unwrap_or_default(),
        subtask: text(doc, "subtask").unwrap_or_default(),
        priority,
        category,
        due_date,
        reminder: date(doc, "reminder").unwrap_or(due_date),
        completed,
        completed_at,
        created_at: date(doc, "createdAt").unwrap_or(due_date),
    })
}

/// Decode every document of a query response, skipping the ones that fail
pub fn decode_query(rows: &[QueryRow]) -> Vec<Task> {
    rows.iter()
        .filter_map(|row| row.document.as_ref())
        .filter_map(|doc| match decode_task(doc) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(error = %e, "skipping undecodable task");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn stored_doc() -> Document {
        serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/tasks/abc123",
            "fields": {
                "userId": { "stringValue": "u1" },
                "title": { "stringValue": "Buy milk" },
                "description": { "stringValue": "2 litres" },
                "subtask": { "stringValue": "check fridge" },
                "priority": { "stringValue": "High" },
                "category": { "stringValue": "Shopping" },
                "dueDate": { "stringValue": "2024-05-01T09:30:00.000Z" },
                "reminder": { "stringValue": "2024-05-01T09:00:00.000Z" },
                "completed": { "booleanValue": true },
                "completedAt": { "stringValue": "2024-05-01T10:00:00.000Z" },
                "createdAt": { "timestampValue": "2024-04-30T08:00:00Z" },
                "attachments": { "arrayValue": { "values": [] } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_full_task() {
        let task = decode_task(&stored_doc()).unwrap();
        assert_eq!(task.id, "abc123");
        assert_eq!(task.owner_id, "u1");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, Category::Shopping);
        assert_eq!(task.due_date, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
        assert_eq!(task.reminder, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
        assert_eq!(task.created_at, Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_minimal_task() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/tasks/t2",
            "fields": {
                "userId": { "stringValue": "u1" },
                "title": { "stringValue": "Call mum" },
                "dueDate": { "stringValue": "2024-05-02T18:00:00.000Z" },
                "completedAt": { "stringValue": "2024-05-02T19:00:00.000Z" }
            }
        }))
        .unwrap();

        let task = decode_task(&doc).unwrap();
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert_eq!(task.description, "");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.reminder, task.due_date);
    }

    #[test]
    fn test_decode_missing_title_fails() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/tasks/t3",
            "fields": {
                "userId": { "stringValue": "u1" },
                "dueDate": { "stringValue": "2024-05-02T18:00:00.000Z" }
            }
        }))
        .unwrap();
        assert!(matches!(decode_task(&doc), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_empty_query_result() {
        let rows: Vec<QueryRow> =
            serde_json::from_value(json!([{ "readTime": "2024-05-01T00:00:00Z" }])).unwrap();
        assert!(decode_query(&rows).is_empty());
    }

    #[test]
    fn test_encode_new_task() {
        let due = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let mut new = NewTask::new("u1", "Buy milk", due);
        new.priority = Priority::Low;

        let fields = encode_new_task(&new);
        assert_eq!(fields["userId"], json!({ "stringValue": "u1" }));
        assert_eq!(fields["priority"], json!({ "stringValue": "Low" }));
        assert_eq!(fields["dueDate"], json!({ "stringValue": "2024-05-01T09:30:00.000Z" }));
        assert_eq!(fields["completed"], json!({ "booleanValue": false }));
        assert!(!fields.contains_key("completedAt"));
    }

    #[test]
    fn test_encode_reopen_patch_clears_completed_at() {
        let (fields, mask) = encode_patch(&TaskPatch::reopening());
        assert_eq!(mask, vec!["completed", "completedAt"]);
        assert_eq!(fields["completed"], json!({ "booleanValue": false }));
        assert!(!fields.contains_key("completedAt"));
    }

    #[test]
    fn test_unknown_field_types_are_ignored() {
        assert_eq!(FieldValue::from_json(&json!({ "integerValue": "4" })), None);
        assert_eq!(FieldValue::from_json(&json!({ "nullValue": null })), Some(FieldValue::Null));
    }
}
