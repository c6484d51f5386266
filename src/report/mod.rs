//! Cross-tabulation of tasks by assignee and release.

pub mod xlsx;

use std::collections::HashMap;

use crate::model::task::Task;

pub const DEFAULT_COLUMN: &str = "Default";
pub const SUM_COLUMN: &str = "Sum";

/// Cell written for zero counts.
pub const BLANK: &str = " ";

/// Rectangular table of strings. Row 0 is the header, column 0 the assignee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub table: ReportTable,
    /// Tasks left out of the table for lacking a title or assignee
    pub incomplete: Vec<Task>,
}

/// Percentage table of each assignee's tasks per release.
///
/// Release columns appear in first-seen order, followed by `Default` (tasks
/// without a release) and `Sum`. Assignees appear in first-seen order too.
pub fn build_report(tasks: &[Task]) -> Report {
    let (complete, incomplete): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|t| !t.is_broken());

    let mut categories: Vec<&str> = Vec::new();
    let mut category_index: HashMap<&str, usize> = HashMap::new();
    let mut names: Vec<&str> = Vec::new();
    let mut name_index: HashMap<&str, usize> = HashMap::new();

    for task in &complete {
        let release = task.release();
        if !release.is_empty() && !category_index.contains_key(release) {
            category_index.insert(release, categories.len());
            categories.push(release);
        }
        for name in task.assignees() {
            if !name_index.contains_key(name.as_str()) {
                name_index.insert(name, names.len());
                names.push(name);
            }
        }
    }

    let default_col = categories.len();
    let sum_col = default_col + 1;
    let mut counts = vec![vec![0usize; sum_col + 1]; names.len()];

    for task in &complete {
        let col = category_index
            .get(task.release())
            .copied()
            .unwrap_or(default_col);
        for name in task.assignees() {
            let row = &mut counts[name_index[name.as_str()]];
            row[col] += 1;
            row[sum_col] += 1;
        }
    }

    let mut header = vec![String::new()];
    header.extend(categories.iter().map(|c| c.to_string()));
    header.push(DEFAULT_COLUMN.to_string());
    header.push(SUM_COLUMN.to_string());

    let rows = names
        .iter()
        .zip(&counts)
        .map(|(name, row)| {
            let total = row[sum_col];
            let mut cells = vec![name.to_string()];
            cells.extend(row.iter().map(|&count| percentage_cell(count, total)));
            cells
        })
        .collect();

    Report {
        table: ReportTable { header, rows },
        incomplete: incomplete.into_iter().cloned().collect(),
    }
}

/// `count` as a share of `total`, e.g. `"75.0%"`; zero renders as [`BLANK`].
pub fn percentage_cell(count: usize, total: usize) -> String {
    if count == 0 || total == 0 {
        return BLANK.to_string();
    }
    let value = (count as f64 / total as f64 * 100.0 * 100.0).round_ties_even() / 100.0;
    format!("{}%", format_float(value))
}

/// Shortest round-trip form, always with a fractional part (`75.0`, `33.33`).
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
