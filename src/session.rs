// Session controller: one state value, one transition function

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::filter::{self, Filter};
use crate::form::{self, FormErrors, FormState};
use crate::models::{NewTask, Priority, Task, TaskDraft};
use crate::store::TaskStore;
use crate::timer::{Countdown, Urgency};

/// A user intent or timer event
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartSession,
    ResetSession,
    Tick,
    BeginAdd,
    BeginEdit(String),
    EditDraft(DraftEdit),
    /// Submit explicit form data
    SubmitForm(TaskDraft),
    /// Submit whatever the open form currently holds
    SubmitDraft,
    CancelForm,
    ToggleComplete(String),
    DeleteTask(String),
    Search(String),
    ClearSearch,
}

/// Change to a single field of the open form
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Title(String),
    Description(String),
    Priority(Option<Priority>),
    DueDate(Option<chrono::DateTime<Utc>>),
}

/// Result of applying an action
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    /// Nothing to do: unknown id, no open form, session already running
    Ignored,
    /// Form submission failed validation; nothing was mutated
    Rejected(FormErrors),
    /// The caller should begin delivering `Action::Tick` once per second
    ScheduleTicks,
    /// The caller should stop delivering ticks
    CancelTicks,
}

/// Counts shown alongside the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub filtered: usize,
}

/// Read-only snapshot handed to the presentation layer
#[derive(Debug)]
pub struct SessionView<'a> {
    pub tasks: Vec<&'a Task>,
    pub loading: bool,
    pub active: bool,
    pub remaining: u64,
    pub time_display: String,
    pub expired: bool,
    pub urgency: Urgency,
    pub form: Option<&'a FormState>,
    pub search_query: &'a str,
    pub is_searching: bool,
    pub has_tasks: bool,
    pub has_filtered_results: bool,
    pub stats: TaskStats,
}

/// Whole application state: task store, countdown, open form and search query
///
/// User intents arrive as [`Action`]s and [`Session::apply`] is the only
/// transition function. Scheduling or cancelling the recurring tick is left
/// to the caller through the returned [`Outcome`].
pub struct Session {
    store: TaskStore,
    timer: Countdown,
    active: bool,
    form: Option<FormState>,
    search_query: String,
}

impl Session {
    pub fn new(store: TaskStore, session_secs: u64) -> Self {
        Self {
            store,
            timer: Countdown::new(session_secs),
            active: false,
            form: None,
            search_query: String::new(),
        }
    }

    /// Apply one action
    pub fn apply(&mut self, action: Action) -> Outcome {
        debug!(?action, "apply");
        match action {
            Action::StartSession => self.start_session(),
            Action::ResetSession => self.reset_session(),
            Action::Tick => self.tick(),
            Action::BeginAdd => self.begin_add(),
            Action::BeginEdit(id) => self.begin_edit(&id),
            Action::EditDraft(edit) => self.edit_draft(edit),
            Action::SubmitForm(draft) => self.submit_form(draft),
            Action::SubmitDraft => match self.form.as_ref().map(|form| form.draft.clone()) {
                Some(draft) => self.submit_form(draft),
                None => Outcome::Ignored,
            },
            Action::CancelForm => self.cancel_form(),
            Action::ToggleComplete(id) => applied_if(self.store.toggle_complete(&id)),
            Action::DeleteTask(id) => applied_if(self.store.delete(&id)),
            Action::Search(query) => self.search(query),
            Action::ClearSearch => self.search(String::new()),
        }
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Mark the session active, start the countdown and seed an empty store
    pub fn start_session(&mut self) -> Outcome {
        if self.active {
            debug!("start_session: already active");
            return Outcome::Ignored;
        }

        self.active = true;
        self.timer.start();

        if self.store.is_empty() {
            self.seed_sample_tasks();
        }

        info!(remaining = self.timer.remaining(), tasks = self.store.len(), "Session started");
        if self.timer.is_running() {
            Outcome::ScheduleTicks
        } else {
            Outcome::Applied
        }
    }

    fn seed_sample_tasks(&mut self) {
        let now = Utc::now();
        let samples = [
            NewTask {
                title: "Complete technical test".to_string(),
                description: Some("Implement task management application in 60 minutes".to_string()),
                priority: Priority::High,
                completed: false,
                due_date: Some(now + Duration::days(1)),
            },
            NewTask {
                title: "Review code".to_string(),
                description: Some("Review and optimize the implemented code".to_string()),
                priority: Priority::Medium,
                completed: false,
                due_date: Some(now + Duration::days(2)),
            },
            NewTask {
                title: "Document features".to_string(),
                description: Some("Create documentation for implemented features".to_string()),
                priority: Priority::Low,
                completed: true,
                due_date: None,
            },
        ];

        for sample in samples {
            self.store.add(sample);
        }
        info!(count = self.store.len(), "Seeded sample tasks");
    }

    /// End the session and wipe every task, the form and the query
    pub fn reset_session(&mut self) -> Outcome {
        self.active = false;
        self.timer.reset();
        self.store.clear();
        self.form = None;
        self.search_query.clear();

        info!("Session reset");
        Outcome::CancelTicks
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> Outcome {
        if self.timer.tick() {
            info!("Session time is up");
            return Outcome::CancelTicks;
        }
        if self.timer.is_running() {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }

    // ========================================================================
    // Form
    // ========================================================================

    /// Open a blank form for a new task; adding is closed once time is up
    pub fn begin_add(&mut self) -> Outcome {
        if self.timer.is_expired() {
            debug!("begin_add: time is up");
            return Outcome::Ignored;
        }
        self.form = Some(FormState::blank());
        Outcome::Applied
    }

    /// Open the form pre-populated from the task with `id`
    pub fn begin_edit(&mut self, id: &str) -> Outcome {
        match self.store.find_by_id(id) {
            Some(task) => {
                self.form = Some(FormState::editing(task));
                Outcome::Applied
            }
            None => {
                debug!(id, "begin_edit: task not found");
                Outcome::Ignored
            }
        }
    }

    fn edit_draft(&mut self, edit: DraftEdit) -> Outcome {
        let Some(form) = self.form.as_mut() else {
            return Outcome::Ignored;
        };

        match edit {
            DraftEdit::Title(title) => form.set_title(title),
            DraftEdit::Description(description) => form.set_description(description),
            DraftEdit::Priority(priority) => form.set_priority(priority),
            DraftEdit::DueDate(due_date) => form.set_due_date(due_date),
        }
        Outcome::Applied
    }

    /// Validate then add or update; the form closes once validation passes
    pub fn submit_form(&mut self, draft: TaskDraft) -> Outcome {
        let editing = self.editing_id().map(str::to_string);

        // Edits stay allowed after time is up, new tasks do not
        if editing.is_none() && self.timer.is_expired() {
            debug!("submit_form: time is up, not adding");
            self.form = None;
            return Outcome::Ignored;
        }

        if let Err(errors) = form::validate(&draft) {
            debug!(%errors, "submit_form: rejected");
            self.form = Some(FormState {
                draft,
                editing,
                errors: errors.clone(),
            });
            return Outcome::Rejected(errors);
        }

        match editing {
            Some(id) => {
                self.store.update(&id, &draft.to_patch());
            }
            None => {
                self.store.add(draft.to_new_task(false));
            }
        }

        self.form = None;
        Outcome::Applied
    }

    /// Close the form and discard its input
    pub fn cancel_form(&mut self) -> Outcome {
        match self.form.take() {
            Some(_) => Outcome::Applied,
            None => Outcome::Ignored,
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Store the query verbatim; the filtered view follows it
    pub fn search(&mut self, query: String) -> Outcome {
        self.search_query = query;
        Outcome::Applied
    }

    /// Tasks matching the current query, in collection order
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        Filter::Text(self.search_query.clone()).apply(self.store.tasks())
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn form(&self) -> Option<&FormState> {
        self.form.as_ref()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.form.as_ref().and_then(|form| form.editing.as_deref())
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn is_searching(&self) -> bool {
        !filter::is_blank_query(&self.search_query)
    }

    pub fn stats(&self) -> TaskStats {
        let total = self.store.len();
        let completed = self.store.completed_only().len();
        TaskStats {
            total,
            pending: total - completed,
            completed,
            filtered: self.filtered_tasks().len(),
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        let tasks = self.filtered_tasks();
        let stats = TaskStats {
            filtered: tasks.len(),
            ..self.stats()
        };

        SessionView {
            has_filtered_results: !tasks.is_empty(),
            tasks,
            loading: !self.store.is_loaded(),
            active: self.active,
            remaining: self.timer.remaining(),
            time_display: self.timer.display(),
            expired: self.timer.is_expired(),
            urgency: self.timer.urgency(),
            form: self.form.as_ref(),
            search_query: &self.search_query,
            is_searching: self.is_searching(),
            has_tasks: !self.store.is_empty(),
            stats,
        }
    }
}

fn applied_if(changed: bool) -> Outcome {
    if changed { Outcome::Applied } else { Outcome::Ignored }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TASKS_KEY;
    use crate::storage::MemoryStorage;

    fn session() -> Session {
        Session::new(TaskStore::open(MemoryStorage::new()), 3600)
    }

    fn draft(title: &str, priority: Priority) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            priority: Some(priority),
            due_date: None,
        }
    }

    #[test]
    fn test_start_session_seeds_empty_store() {
        let mut s = session();

        assert_eq!(s.apply(Action::StartSession), Outcome::ScheduleTicks);
        assert!(s.is_active());
        assert!(s.timer().is_running());

        let tasks = s.store().tasks();
        assert_eq!(tasks.len(), 3);
        let priorities: Vec<Priority> = tasks.iter().map(|t| t.priority).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);

        assert!(!tasks[0].completed && tasks[0].due_date.is_some());
        assert!(!tasks[1].completed && tasks[1].due_date.is_some());
        assert!(tasks[1].due_date > tasks[0].due_date);
        assert!(tasks[2].completed);
        assert!(tasks[2].due_date.is_none());
        assert_eq!(tasks[2].title, "Document features");
    }

    #[test]
    fn test_start_session_skips_seed_when_tasks_exist() {
        let mut s = session();
        s.apply(Action::SubmitForm(draft("Mine", Priority::Low)));

        s.apply(Action::StartSession);
        assert_eq!(s.store().len(), 1);
        assert_eq!(s.store().tasks()[0].title, "Mine");
    }

    #[test]
    fn test_start_session_twice_is_ignored() {
        let mut s = session();
        s.apply(Action::StartSession);

        assert_eq!(s.apply(Action::StartSession), Outcome::Ignored);
        assert_eq!(s.store().len(), 3);
    }

    #[test]
    fn test_reset_session_clears_everything() {
        let mut s = session();
        s.apply(Action::StartSession);
        s.apply(Action::Tick);
        s.apply(Action::Search("review".to_string()));
        let id = s.store().tasks()[0].id.clone();
        s.apply(Action::BeginEdit(id));

        assert_eq!(s.apply(Action::ResetSession), Outcome::CancelTicks);
        assert!(!s.is_active());
        assert!(s.store().is_empty());
        assert!(s.form().is_none());
        assert!(s.editing_id().is_none());
        assert_eq!(s.search_query(), "");
        assert_eq!(s.timer().remaining(), 3600);
        assert!(!s.timer().is_running());
        assert_eq!(s.store().storage().get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_submit_new_task() {
        let mut s = session();
        s.apply(Action::BeginAdd);

        assert_eq!(s.apply(Action::SubmitForm(draft("Buy milk", Priority::Low))), Outcome::Applied);
        assert!(s.form().is_none());

        let tasks = s.store().tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(tasks[0].priority, Priority::Low);
        assert!(!tasks[0].completed);
        assert!(tasks[0].description.is_none());
        assert!(tasks[0].due_date.is_none());
        assert!(!tasks[0].id.is_empty());
    }

    #[test]
    fn test_submit_title_too_long_is_rejected() {
        let mut s = session();
        s.apply(Action::BeginAdd);

        let outcome = s.apply(Action::SubmitForm(draft(&"x".repeat(101), Priority::Low)));
        let Outcome::Rejected(errors) = outcome.clone() else {
            panic!("expected rejection, got {:?}", outcome);
        };

        assert!(errors.title.is_some());
        assert!(s.store().is_empty());
        // Form stays open with the errors shown
        assert_eq!(s.form().unwrap().errors, errors);
    }

    #[test]
    fn test_edit_flow_updates_in_place() {
        let mut s = session();
        s.apply(Action::SubmitForm(draft("Old title", Priority::Low)));
        let original = s.store().tasks()[0].clone();

        assert_eq!(s.apply(Action::BeginEdit(original.id.clone())), Outcome::Applied);
        let form = s.form().unwrap();
        assert_eq!(form.draft.title, "Old title");
        assert_eq!(s.editing_id(), Some(original.id.as_str()));

        s.apply(Action::EditDraft(DraftEdit::Title("New title".to_string())));
        s.apply(Action::EditDraft(DraftEdit::Priority(Some(Priority::High))));
        assert_eq!(s.apply(Action::SubmitDraft), Outcome::Applied);

        let updated = &s.store().tasks()[0];
        assert_eq!(s.store().len(), 1);
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(s.editing_id().is_none());
        assert!(s.form().is_none());
    }

    #[test]
    fn test_edit_keeps_completion() {
        let mut s = session();
        s.apply(Action::SubmitForm(draft("Done already", Priority::Low)));
        let id = s.store().tasks()[0].id.clone();
        s.apply(Action::ToggleComplete(id.clone()));

        s.apply(Action::BeginEdit(id.clone()));
        s.apply(Action::SubmitDraft);
        assert!(s.store().find_by_id(&id).unwrap().completed);
    }

    #[test]
    fn test_submit_for_deleted_task_closes_form() {
        let mut s = session();
        s.apply(Action::SubmitForm(draft("Doomed", Priority::Low)));
        let id = s.store().tasks()[0].id.clone();

        s.apply(Action::BeginEdit(id.clone()));
        s.apply(Action::DeleteTask(id));

        assert_eq!(s.apply(Action::SubmitDraft), Outcome::Applied);
        assert!(s.store().is_empty());
        assert!(s.form().is_none());
    }

    #[test]
    fn test_begin_edit_unknown_is_noop() {
        let mut s = session();
        assert_eq!(s.apply(Action::BeginEdit("missing".to_string())), Outcome::Ignored);
        assert!(s.form().is_none());
    }

    #[test]
    fn test_cancel_form_discards_input() {
        let mut s = session();
        s.apply(Action::BeginAdd);
        s.apply(Action::EditDraft(DraftEdit::Title("Half typed".to_string())));

        assert_eq!(s.apply(Action::CancelForm), Outcome::Applied);
        assert!(s.form().is_none());
        assert!(s.store().is_empty());
        assert_eq!(s.apply(Action::SubmitDraft), Outcome::Ignored);
        assert_eq!(s.apply(Action::CancelForm), Outcome::Ignored);
    }

    #[test]
    fn test_toggle_and_delete_unknown_ids() {
        let mut s = session();
        s.apply(Action::StartSession);

        assert_eq!(s.apply(Action::ToggleComplete("missing".to_string())), Outcome::Ignored);
        assert_eq!(s.apply(Action::DeleteTask("missing".to_string())), Outcome::Ignored);
        assert_eq!(s.store().len(), 3);
    }

    #[test]
    fn test_search_filters_without_mutating() {
        let mut s = session();
        s.apply(Action::StartSession);

        s.apply(Action::Search("  ".to_string()));
        assert_eq!(s.search_query(), "  ");
        assert!(!s.is_searching());
        assert_eq!(s.filtered_tasks().len(), 3);

        s.apply(Action::Search("REVIEW".to_string()));
        let titles: Vec<&str> = s.filtered_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Review code"]);

        s.apply(Action::Search("nothing matches this".to_string()));
        assert!(s.filtered_tasks().is_empty());
        assert_eq!(s.store().len(), 3);

        let view = s.view();
        assert!(view.is_searching);
        assert!(view.has_tasks);
        assert!(!view.has_filtered_results);
        assert_eq!(view.stats.filtered, 0);
    }

    #[test]
    fn test_filtered_view_follows_collection_changes() {
        let mut s = session();
        s.apply(Action::Search("milk".to_string()));
        assert!(s.filtered_tasks().is_empty());

        s.apply(Action::SubmitForm(draft("Buy milk", Priority::Low)));
        assert_eq!(s.filtered_tasks().len(), 1);

        s.apply(Action::ClearSearch);
        assert_eq!(s.search_query(), "");
    }

    #[test]
    fn test_stats() {
        let mut s = session();
        s.apply(Action::StartSession);
        s.apply(Action::Search("low".to_string()));

        let view = s.view();
        assert_eq!(
            view.stats,
            TaskStats {
                total: 3,
                pending: 2,
                completed: 1,
                filtered: 1,
            }
        );
        assert_eq!(view.tasks.len(), 1);
        assert!(!view.loading);
        assert!(view.active);
        assert_eq!(view.time_display, "60:00");
    }

    #[test]
    fn test_tick_until_expiry() {
        let mut s = Session::new(TaskStore::open(MemoryStorage::new()), 3);
        assert_eq!(s.apply(Action::Tick), Outcome::Ignored);

        s.apply(Action::StartSession);
        assert_eq!(s.apply(Action::Tick), Outcome::Applied);
        assert_eq!(s.apply(Action::Tick), Outcome::Applied);
        assert_eq!(s.apply(Action::Tick), Outcome::CancelTicks);
        assert!(s.view().expired);
        assert_eq!(s.view().urgency, Urgency::Critical);

        s.apply(Action::ResetSession);
        assert!(!s.timer().is_expired());
        assert_eq!(s.timer().remaining(), 3);
    }

    #[test]
    fn test_loading_flag_before_load() {
        let s = Session::new(TaskStore::new(MemoryStorage::new()), 3600);
        assert!(s.view().loading);
    }

    #[test]
    fn test_add_blocked_after_time_up() {
        let mut s = Session::new(TaskStore::open(MemoryStorage::new()), 1);
        s.apply(Action::StartSession);
        assert_eq!(s.apply(Action::Tick), Outcome::CancelTicks);

        assert_eq!(s.apply(Action::BeginAdd), Outcome::Ignored);
        assert!(s.form().is_none());

        assert_eq!(s.apply(Action::SubmitForm(draft("late", Priority::Low))), Outcome::Ignored);
        assert_eq!(s.store().len(), 3);
    }

    #[test]
    fn test_edit_toggle_delete_allowed_after_time_up() {
        let mut s = Session::new(TaskStore::open(MemoryStorage::new()), 1);
        s.apply(Action::StartSession);
        s.apply(Action::Tick);
        let ids: Vec<String> = s.store().tasks().iter().map(|t| t.id.clone()).collect();

        assert_eq!(s.apply(Action::BeginEdit(ids[0].clone())), Outcome::Applied);
        s.apply(Action::EditDraft(DraftEdit::Title("Edited late".to_string())));
        assert_eq!(s.apply(Action::SubmitDraft), Outcome::Applied);
        assert_eq!(s.store().tasks()[0].title, "Edited late");

        assert_eq!(s.apply(Action::ToggleComplete(ids[1].clone())), Outcome::Applied);
        assert_eq!(s.apply(Action::DeleteTask(ids[2].clone())), Outcome::Applied);
        assert_eq!(s.store().len(), 2);

        // Reset reopens adding
        s.apply(Action::ResetSession);
        assert_eq!(s.apply(Action::BeginAdd), Outcome::Applied);
    }
}
