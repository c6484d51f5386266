//! Field extractors shared by every team.
//!
//! Release extraction differs per team and lives in [`crate::team`].

pub mod rules;

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::ExtractError;
use crate::model::work_item::{field, RawWorkItem};

pub fn title(item: &RawWorkItem) -> String {
    item.text_or_empty(field::TITLE)
}

/// Names from the assignee field and from a tagged-name marker in the tags.
pub fn assignees(item: &RawWorkItem) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    let assigned_to = item.text_or_empty(field::ASSIGNED_TO);
    if !assigned_to.is_empty() {
        names.insert(rules::display_name(&assigned_to).to_string());
    }

    let tags = item.text_or_empty(field::TAGS);
    if !tags.is_empty() {
        if let Some(name) = rules::tagged_name(&tags) {
            names.insert(name);
        }
    }

    names
}

pub fn date_created(item: &RawWorkItem) -> Result<NaiveDate, ExtractError> {
    parse_field_date(item, field::CREATED_DATE)
}

pub fn date_closed(item: &RawWorkItem) -> Result<NaiveDate, ExtractError> {
    parse_field_date(item, field::CLOSED_DATE)
}

/// Name reported when an item carries no `_links.html.href`.
pub const LINK: &str = "_links.html.href";

pub fn link(item: &RawWorkItem) -> Result<String, ExtractError> {
    item.link
        .clone()
        .filter(|href| !href.is_empty())
        .ok_or(ExtractError::MissingField {
            id: item.id,
            field: LINK,
        })
}

/// Calendar day from the first 10 characters (`YYYY-MM-DD`) of a timestamp.
pub fn calendar_day(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn parse_field_date(item: &RawWorkItem, name: &'static str) -> Result<NaiveDate, ExtractError> {
    let raw = item.text(name).ok_or(ExtractError::MissingField {
        id: item.id,
        field: name,
    })?;
    calendar_day(&raw).ok_or(ExtractError::DateParse {
        id: item.id,
        field: name,
        value: raw,
    })
}
