//! Selection criteria for one tracker query.
//!
//! The same [`ItemFilter`] is rendered to WIQL for the server and evaluated
//! directly against dumped items, so both sources select identically.

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::extract::calendar_day;
use crate::model::work_item::{field, RawWorkItem};

/// Items carrying this tag never count towards a report.
pub const EXCLUDE_TAG: &str = "EXCLUDE_FROM_TIME_REPORTS";

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            bail!("Date range starts after it ends: {from} > {to}");
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    /// `collection[/project]` path the query runs against
    pub scope: &'static str,
    pub state: &'static str,
    pub work_item_types: &'static [&'static str],
    pub area_path: Option<&'static str>,
    pub excluded_project: Option<&'static str>,
    /// Whether a closed-date override replaces the closed date for range checks
    pub honor_override: bool,
    /// Whether parent items must be fetched to classify results
    pub fetch_ancestors: bool,
}

impl ItemFilter {
    pub fn to_wiql(&self, range: &DateRange) -> String {
        let mut clauses = vec![format!("[{}] = {}", field::STATE, quote(self.state))];

        let types: Vec<String> = self
            .work_item_types
            .iter()
            .map(|t| format!("[{}] = {}", field::WORK_ITEM_TYPE, quote(t)))
            .collect();
        if types.len() == 1 {
            clauses.push(types[0].clone());
        } else if !types.is_empty() {
            clauses.push(format!("({})", types.join(" OR ")));
        }

        if let Some(area) = self.area_path {
            clauses.push(format!("[{}] = {}", field::AREA_PATH, quote(area)));
        }
        if let Some(project) = self.excluded_project {
            clauses.push(format!("[{}] <> {}", field::TEAM_PROJECT, quote(project)));
        }

        let from = quote(&range.from().format("%Y-%m-%d").to_string());
        let to = quote(&range.to().format("%Y-%m-%d").to_string());
        let closed = format!(
            "[{f}] >= {from} AND [{f}] <= {to}",
            f = field::CLOSED_DATE
        );
        if self.honor_override {
            let o = field::CLOSED_DATE_OVERRIDE;
            clauses.push(format!(
                "(({closed} AND [{o}] = '') OR ([{o}] >= {from} AND [{o}] <= {to}))"
            ));
        } else {
            clauses.push(format!("({closed})"));
        }

        clauses.push(format!("[{}] NOT CONTAINS {}", field::TAGS, quote(EXCLUDE_TAG)));

        format!(
            "SELECT [System.Id]\nFROM workitems\nWHERE\n    {}\nORDER BY [{}]",
            clauses.join("\n    AND "),
            field::ASSIGNED_TO
        )
    }

    /// In-memory equivalent of the WIQL predicate.
    pub fn matches(&self, item: &RawWorkItem, range: &DateRange) -> bool {
        let text = |name: &str| item.text_or_empty(name);

        if !text(field::STATE).eq_ignore_ascii_case(self.state) {
            return false;
        }
        let kind = text(field::WORK_ITEM_TYPE);
        if !self
            .work_item_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&kind))
        {
            return false;
        }
        if let Some(area) = self.area_path {
            if text(field::AREA_PATH).to_lowercase() != area.to_lowercase() {
                return false;
            }
        }
        if let Some(project) = self.excluded_project {
            if text(field::TEAM_PROJECT).eq_ignore_ascii_case(project) {
                return false;
            }
        }
        if text(field::TAGS)
            .to_lowercase()
            .contains(&EXCLUDE_TAG.to_lowercase())
        {
            return false;
        }

        let in_range = |name: &str| calendar_day(&text(name)).is_some_and(|d| range.contains(d));
        if self.honor_override && !text(field::CLOSED_DATE_OVERRIDE).is_empty() {
            in_range(field::CLOSED_DATE_OVERRIDE)
        } else {
            in_range(field::CLOSED_DATE)
        }
    }
}

/// WIQL string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
