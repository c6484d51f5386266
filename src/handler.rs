//! Builds normalized tasks from a team's closed work items.

use anyhow::Result;
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::extract;
use crate::filter::DateRange;
use crate::model::task::Task;
use crate::model::work_item::{RawWorkItem, WorkItemSet};
use crate::providers::WorkItemSource;
use crate::team::Team;

pub fn build_task(team: Team, item: &RawWorkItem, set: &WorkItemSet) -> Result<Task, ExtractError> {
    let task = Task::new(
        extract::title(item),
        extract::assignees(item),
        team.release(item, set),
        extract::link(item)?,
        extract::date_created(item)?,
        extract::date_closed(item)?,
    );
    if task.is_broken() {
        debug!(id = item.id, missing = ?task.missing(), "work item lacks required data");
    }
    Ok(task)
}

/// One task per item, in set order. The first extraction error fails the whole set.
pub fn build_tasks(team: Team, set: &WorkItemSet) -> Result<Vec<Task>, ExtractError> {
    set.items()
        .iter()
        .map(|item| build_task(team, item, set))
        .collect()
}

/// Runs every query of `team` and builds tasks for the results, query by query.
pub async fn collect_tasks(
    team: Team,
    source: &dyn WorkItemSource,
    range: &DateRange,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for filter in team.filters() {
        let set = source.query(&filter, range).await?;
        if set.is_empty() {
            debug!(team = %team, scope = filter.scope, "query returned no items");
        }
        tasks.extend(build_tasks(team, &set)?);
    }

    let broken = tasks.iter().filter(|t| t.is_broken()).count();
    info!(
        team = %team,
        source = source.name(),
        tasks = tasks.len(),
        broken,
        "collected tasks"
    );
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::work_item::field;
    use chrono::NaiveDate;

    fn item(id: u32) -> RawWorkItem {
        RawWorkItem::new(id)
            .with_field(field::TITLE, format!("Item {id}"))
            .with_field(field::ASSIGNED_TO, "Ivan Petrov <ivan@x.com>")
            .with_field(field::CREATED_DATE, "2023-01-02T09:00:00Z")
            .with_field(field::CLOSED_DATE, "2023-01-15T18:30:00Z")
            .with_link(&format!("https://tfs/wi/{id}"))
    }

    #[test]
    fn builds_full_task() {
        let raw = item(1).with_field(field::AREA_PATH, "NLC\\AIS\\2.5");
        let set = WorkItemSet::new(vec![raw.clone()]);
        let task = build_task(Team::Is, &raw, &set).unwrap();

        assert_eq!(task.title(), "Item 1");
        assert!(task.assignees().contains("Ivan Petrov"));
        assert_eq!(task.release(), "IS_2.5");
        assert_eq!(task.link(), "https://tfs/wi/1");
        assert_eq!(task.date_created(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(task.date_closed(), NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        assert!(!task.is_broken());
    }

    #[test]
    fn missing_title_yields_broken_task() {
        let raw = item(1).with_field(field::TITLE, "");
        let set = WorkItemSet::new(vec![raw.clone()]);
        assert!(build_task(Team::Cai, &raw, &set).unwrap().is_broken());
    }

    #[test]
    fn keeps_input_order_and_duplicates() {
        let set = WorkItemSet::new(vec![item(3), item(1), item(3)]);
        let titles: Vec<String> = build_tasks(Team::Lingvo, &set)
            .unwrap()
            .iter()
            .map(|t| t.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Item 3", "Item 1", "Item 3"]);
    }

    #[test]
    fn bad_date_fails_the_batch() {
        let set = WorkItemSet::new(vec![
            item(1),
            item(2).with_field(field::CLOSED_DATE, "n/a"),
            item(3),
        ]);
        let err = build_tasks(Team::Is, &set).unwrap_err();
        assert!(matches!(err, ExtractError::DateParse { id: 2, .. }));
    }

    #[test]
    fn missing_link_fails_the_batch() {
        let mut unlinked = item(2);
        unlinked.link = None;
        let set = WorkItemSet::new(vec![item(1), unlinked]);
        let err = build_tasks(Team::Cai, &set).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MissingField { id: 2, field: extract::LINK }
        ));
    }
}
