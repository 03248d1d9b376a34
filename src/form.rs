// Create/edit form state and field-level validation

use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{Priority, Task, TaskDraft};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Form fields that can carry a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Priority,
    DueDate,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Priority => "priority",
            Field::DueDate => "dueDate",
        }
    }
}

/// Per-field validation messages; empty means the draft is valid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.priority.is_none() && self.due_date.is_none()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            Field::Description => self.description.as_deref(),
            Field::Priority => self.priority.as_deref(),
            Field::DueDate => self.due_date.as_deref(),
        }
    }

    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Title => self.title = None,
            Field::Description => self.description = None,
            Field::Priority => self.priority = None,
            Field::DueDate => self.due_date = None,
        }
    }

    /// Messages paired with their field, in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        [Field::Title, Field::Description, Field::Priority, Field::DueDate]
            .into_iter()
            .filter_map(move |field| self.get(field).map(|msg| (field, msg)))
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{}: {}", field.as_str(), msg)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Check a draft before it reaches the store
pub fn validate(draft: &TaskDraft) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    if draft.title.trim().is_empty() {
        errors.title = Some("Title is required".to_string());
    } else if draft.title.chars().count() > MAX_TITLE_CHARS {
        errors.title = Some(format!("Title must be {} characters or less", MAX_TITLE_CHARS));
    }

    if draft.description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.description = Some(format!(
            "Description must be {} characters or less",
            MAX_DESCRIPTION_CHARS
        ));
    }

    if draft.priority.is_none() {
        errors.priority = Some("Priority is required".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// An open create/edit form
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub draft: TaskDraft,
    /// Id of the task being edited, `None` when creating
    pub editing: Option<String>,
    pub errors: FormErrors,
}

impl FormState {
    pub fn blank() -> Self {
        Self {
            draft: TaskDraft::default(),
            editing: None,
            errors: FormErrors::default(),
        }
    }

    /// Form pre-populated with the editable fields of `task`
    pub fn editing(task: &Task) -> Self {
        Self {
            draft: TaskDraft::from_task(task),
            editing: Some(task.id.clone()),
            errors: FormErrors::default(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    // Changing a field clears its pending error

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
        self.errors.clear(Field::Title);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
        self.errors.clear(Field::Description);
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.draft.priority = priority;
        self.errors.clear(Field::Priority);
    }

    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.draft.due_date = due_date;
        self.errors.clear(Field::DueDate);
    }
}
