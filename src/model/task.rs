use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

/// Normalized record for one closed work item.
///
/// Fields are private so `broken` always agrees with `title` and `assignees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    title: String,
    assignees: BTreeSet<String>,
    release: String,
    link: String,
    date_created: NaiveDate,
    date_closed: NaiveDate,
    broken: bool,
}

impl Task {
    pub fn new(
        title: String,
        assignees: impl IntoIterator<Item = String>,
        release: String,
        link: String,
        date_created: NaiveDate,
        date_closed: NaiveDate,
    ) -> Self {
        let assignees: BTreeSet<String> = assignees.into_iter().collect();
        let broken = title.is_empty() || assignees.is_empty();
        Self {
            title,
            assignees,
            release,
            link,
            date_created,
            date_closed,
            broken,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sorted and deduplicated.
    pub fn assignees(&self) -> &BTreeSet<String> {
        &self.assignees
    }

    /// Empty when the item could not be classified.
    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn date_created(&self) -> NaiveDate {
        self.date_created
    }

    pub fn date_closed(&self) -> NaiveDate {
        self.date_closed
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Names of the required attributes this task lacks.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push("title");
        }
        if self.assignees.is_empty() {
            missing.push("assignee");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn task(title: &str, assignees: &[&str]) -> Task {
        Task::new(
            title.to_string(),
            assignees.iter().map(|s| s.to_string()),
            String::new(),
            String::new(),
            day(1),
            day(2),
        )
    }

    #[test]
    fn assignees_are_sorted_and_deduplicated() {
        let t = task("Fix", &["Zoe", "Anna", "Zoe"]);
        let names: Vec<&str> = t.assignees().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Anna", "Zoe"]);
        assert!(!t.is_broken());
    }

    #[test]
    fn empty_title_is_broken() {
        let t = task("", &["Anna"]);
        assert!(t.is_broken());
        assert_eq!(t.missing(), vec!["title"]);
    }

    #[test]
    fn no_assignees_is_broken() {
        let t = task("Fix", &[]);
        assert!(t.is_broken());
        assert_eq!(t.missing(), vec!["assignee"]);
    }

    #[test]
    fn serializes_assignees_in_order() {
        let t = task("Fix", &["b", "a"]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["assignees"], serde_json::json!(["a", "b"]));
        assert_eq!(json["broken"], serde_json::json!(false));
        assert_eq!(json["date_closed"], serde_json::json!("2023-01-02"));
    }
}
