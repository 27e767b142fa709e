use super::enums::{Category, Priority};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A task as stored in the remote collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Document id, assigned by the store
    pub id: String,
    /// Owner uid
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Single line, not a list
    #[serde(default)]
    pub subtask: String,
    pub priority: Priority,
    pub category: Category,
    pub due_date: DateTime<Utc>,
    pub reminder: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Materialize a task from a draft once the store has assigned an id
    pub fn from_new(id: String, new: NewTask) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            subtask: new.subtask,
            priority: new.priority,
            category: new.category,
            due_date: new.due_date,
            reminder: new.reminder,
            completed: false,
            completed_at: None,
            created_at: new.created_at,
        }
    }

    /// Mark as completed at `now`
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(now);
    }

    /// Undo a completion
    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    /// Apply an edit in place
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(subtask) = &patch.subtask {
            self.subtask = subtask.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(reminder) = patch.reminder {
            self.reminder = reminder;
        }
        match patch.completed {
            Some(true) => self.complete(patch.completed_at.unwrap_or_else(Utc::now)),
            Some(false) => self.reopen(),
            None => {}
        }
    }

    /// Due date in local time, for display and bucketing
    pub fn due_local(&self) -> DateTime<Local> {
        self.due_date.with_timezone(&Local)
    }

    pub fn due_formatted(&self) -> String {
        self.due_local().format("%a %d %b %H:%M").to_string()
    }
}

/// A task that has not been stored yet (no id)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub subtask: String,
    pub priority: Priority,
    pub category: Category,
    pub due_date: DateTime<Utc>,
    pub reminder: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Draft owned by `owner_id`, due and reminded at `due_date`
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            description: String::new(),
            subtask: String::new(),
            priority: Priority::default(),
            category: Category::default(),
            due_date,
            reminder: due_date,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of a stored task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subtask: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Patch that marks a task completed at `now`
    pub fn completion(now: DateTime<Utc>) -> Self {
        Self {
            completed: Some(true),
            completed_at: Some(now),
            ..Self::default()
        }
    }

    /// Patch that clears a completion
    pub fn reopening() -> Self {
        Self {
            completed: Some(false),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Wire names of the fields this patch touches
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.title.is_some() {
            paths.push("title");
        }
        if self.description.is_some() {
            paths.push("description");
        }
        if self.subtask.is_some() {
            paths.push("subtask");
        }
        if self.priority.is_some() {
            paths.push("priority");
        }
        if self.category.is_some() {
            paths.push("category");
        }
        if self.due_date.is_some() {
            paths.push("dueDate");
        }
        if self.reminder.is_some() {
            paths.push("reminder");
        }
        if self.completed.is_some() {
            paths.push("completed");
            paths.push("completedAt");
        }
        paths
    }
}
