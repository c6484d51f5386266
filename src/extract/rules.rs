//! Pattern rules over free-text tracker fields.
//!
//! Each rule is one regex behind a function so it can be tested on its own.
//! The character classes follow the teams' tagging conventions exactly; the
//! report buckets depend on them.

use std::sync::LazyLock;

use regex::Regex;

/// `@Иван_Петров` / `#Иван Петров` in the tags field.
static TAGGED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[@#]([А-Яа-яё]+[_ ][А-Яа-яё]+)").expect("tagged name pattern")
});

/// Release codes such as `CAI_1.2.3`.
static RELEASE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]+_\d+\.\d+\.\d+").expect("release code pattern"));

static AIS_AREA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIS\\(\d+\.\d+)").expect("AIS area pattern"));

/// `<project>\[<anything>\]<major.minor[.patch]>`
static VERSIONED_ITERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.+?)\\(.+\\)?(\d+\.\d+(\.\d+)?)").expect("versioned iteration pattern")
});

static LEADING_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+?)\\.*").expect("leading segment pattern"));

/// Display name in front of the `" <email>"` suffix of an assignee value.
/// Values without the suffix are returned whole.
pub fn display_name(assigned_to: &str) -> &str {
    match assigned_to.find(" <") {
        Some(end) => &assigned_to[..end],
        None => assigned_to,
    }
}

/// First Cyrillic first-name/last-name pair tagged with `@` or `#`,
/// with the separator normalized to a space.
pub fn tagged_name(tags: &str) -> Option<String> {
    TAGGED_NAME
        .captures(tags)
        .map(|caps| caps[1].replace('_', " "))
}

pub fn release_code(tags: &str) -> Option<&str> {
    RELEASE_CODE.find(tags).map(|m| m.as_str())
}

/// `major.minor` of an `AIS\<major>.<minor>` area path segment.
pub fn ais_version(area_path: &str) -> Option<&str> {
    AIS_AREA
        .captures(area_path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `(project, version)` of a versioned iteration path.
pub fn iteration_version(iteration_path: &str) -> Option<(&str, &str)> {
    let caps = VERSIONED_ITERATION.captures(iteration_path)?;
    Some((caps.get(1)?.as_str(), caps.get(3)?.as_str()))
}

/// Path segment before the first backslash. Paths without one don't match.
pub fn leading_segment(path: &str) -> Option<&str> {
    LEADING_SEGMENT
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
