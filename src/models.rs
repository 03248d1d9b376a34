// Data models for taskquest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::record::Record;

/// Fixed local-storage key the task blob lives under
pub const TASKS_KEY: &str = "sixty-minute-quest-tasks";

/// A to-do item
///
/// `id` and `created_at` are assigned by the store and never change afterwards.
/// Serialized with camelCase keys; absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn storage_key() -> &'static str {
        TASKS_KEY
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Capitalized label shown next to a task
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority: {} (expected high, medium or low)", other)),
        }
    }
}

/// Caller-supplied fields for a new task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    /// Stamp the fields with a fresh id and creation time
    pub fn into_task(self) -> Task {
        Task {
            id: new_id(),
            title: self.title,
            description: self.description,
            priority: self.priority,
            completed: self.completed,
            due_date: self.due_date,
            created_at: Utc::now(),
        }
    }
}

/// Partial update; `None` leaves a field untouched
///
/// The nested options on `description` and `due_date` distinguish
/// "leave as is" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Merge into `task`; id and creation time are not reachable from a patch
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

/// Form payload for creating or editing a task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Some(Priority::Medium),
            due_date: None,
        }
    }
}

impl TaskDraft {
    /// Editable fields of an existing task
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: Some(task.priority),
            due_date: task.due_date,
        }
    }

    fn description_value(&self) -> Option<String> {
        if self.description.is_empty() {
            None
        } else {
            Some(self.description.clone())
        }
    }

    pub fn to_new_task(&self, completed: bool) -> NewTask {
        NewTask {
            title: self.title.clone(),
            description: self.description_value(),
            priority: self.priority.unwrap_or_default(),
            completed,
            due_date: self.due_date,
        }
    }

    /// Every form field overwrites the task, an empty due date clears it
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.clone()),
            description: Some(self.description_value()),
            priority: self.priority,
            completed: None,
            due_date: Some(self.due_date),
        }
    }
}

/// Generate a fresh task identifier
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
