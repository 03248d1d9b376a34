// Read-only projections over the task collection

use crate::models::{Priority, Task};

/// Predicate selecting a subset of tasks
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact priority
    Priority(Priority),
    /// Completed tasks
    Completed,
    /// Tasks not yet completed
    Pending,
    /// Case-insensitive substring over title, description and priority label
    Text(String),
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::Priority(priority) => task.priority == *priority,
            Filter::Completed => task.completed,
            Filter::Pending => !task.completed,
            Filter::Text(query) => matches_query(task, query),
        }
    }

    /// Matching tasks in collection order
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Priority(p) => write!(f, "priority={}", p),
            Filter::Completed => write!(f, "completed"),
            Filter::Pending => write!(f, "pending"),
            Filter::Text(q) => write!(f, "text~{:?}", q),
        }
    }
}

/// A blank (empty or whitespace-only) query matches every task
pub fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

/// Substring match of the lowercased query; the query itself is not trimmed
pub fn matches_query(task: &Task, query: &str) -> bool {
    if is_blank_query(query) {
        return true;
    }

    let needle = query.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
        || task.priority.as_str().contains(&needle)
}

/// Apply filters conjunctively
pub fn filter_all<'a>(tasks: &'a [Task], filters: &[Filter]) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| filters.iter().all(|f| f.matches(task)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, title: &str, description: Option<&str>, priority: Priority, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            priority,
            completed,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    fn fixtures() -> Vec<Task> {
        vec![
            task("1", "Buy milk", None, Priority::Low, false),
            task("2", "Write report", Some("Quarterly NUMBERS"), Priority::High, true),
            task("3", "Call plumber", Some("kitchen sink"), Priority::Medium, false),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_filter_priority_and_completion() {
        let tasks = fixtures();

        assert_eq!(ids(&Filter::Priority(Priority::High).apply(&tasks)), vec!["2"]);
        assert_eq!(ids(&Filter::Completed.apply(&tasks)), vec!["2"]);
        assert_eq!(ids(&Filter::Pending.apply(&tasks)), vec!["1", "3"]);
    }

    #[test]
    fn test_blank_query_matches_all_in_order() {
        let tasks = fixtures();

        assert_eq!(ids(&Filter::Text(String::new()).apply(&tasks)), vec!["1", "2", "3"]);
        assert_eq!(ids(&Filter::Text("   ".to_string()).apply(&tasks)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let tasks = fixtures();

        assert_eq!(ids(&Filter::Text("MILK".to_string()).apply(&tasks)), vec!["1"]);
        assert_eq!(ids(&Filter::Text("numbers".to_string()).apply(&tasks)), vec!["2"]);
    }

    #[test]
    fn test_query_matches_priority_label() {
        let tasks = fixtures();

        assert_eq!(ids(&Filter::Text("med".to_string()).apply(&tasks)), vec!["3"]);
        assert_eq!(ids(&Filter::Text("High".to_string()).apply(&tasks)), vec!["2"]);
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let tasks = fixtures();

        // Surrounding space is part of the needle
        assert_eq!(ids(&Filter::Text(" sink".to_string()).apply(&tasks)), vec!["3"]);
        assert!(Filter::Text("sink ".to_string()).apply(&tasks).is_empty());
    }

    #[test]
    fn test_no_match_returns_empty() {
        let tasks = fixtures();
        assert!(Filter::Text("zebra".to_string()).apply(&tasks).is_empty());
    }

    #[test]
    fn test_filter_all_is_conjunctive() {
        let tasks = fixtures();
        let filters = vec![Filter::Pending, Filter::Text("l".to_string())];

        assert_eq!(ids(&filter_all(&tasks, &filters)), vec!["1", "3"]);
        assert_eq!(ids(&filter_all(&tasks, &[])), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(Filter::Priority(Priority::Low).to_string(), "priority=low");
        assert_eq!(Filter::Pending.to_string(), "pending");
    }
}
