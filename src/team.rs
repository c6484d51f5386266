use std::fmt;
use std::str::FromStr;

use anyhow::bail;

use crate::extract::rules;
use crate::filter::ItemFilter;
use crate::model::work_item::{field, RawWorkItem, WorkItemSet};

/// Teams with their own query scope and release conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Cai,
    Is,
    Lingvo,
}

/// Lingvo iteration projects whose versions make up release codes.
const LINGVO_VERSIONED: &[(&str, &str)] = &[
    ("Lingvo X6", "LX6"),
    ("lingvo.mobile.iOS", "LMI"),
    ("lingvo.mobile.android", "LMA"),
    ("lingvo.mac", "LFM"),
    ("lingvo.live.ios", "LLI"),
];

/// Lingvo iteration projects reported as one bucket regardless of version.
const LINGVO_UNVERSIONED: &[(&str, &str)] = &[
    ("lingvo.mobile.services", "LLB"),
    ("lingvo.live.services", "LLB"),
    ("lingvo.live.web", "LLWW"),
];

const CAI_SCOPE: &str = "HQ/ContentAI";

impl Team {
    pub const ALL: [Team; 3] = [Team::Cai, Team::Is, Team::Lingvo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Cai => "cai",
            Team::Is => "is",
            Team::Lingvo => "lingvo",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Team::Cai => "Cai",
            Team::Is => "IS",
            Team::Lingvo => "Lingvo",
        }
    }

    /// Queries whose results together make up the team's closed items, in order.
    pub fn filters(&self) -> Vec<ItemFilter> {
        match self {
            Team::Cai => {
                let tasks = ItemFilter {
                    scope: CAI_SCOPE,
                    state: "Done",
                    work_item_types: &["Task"],
                    area_path: None,
                    excluded_project: None,
                    honor_override: true,
                    fetch_ancestors: true,
                };
                let backlog = |area| ItemFilter {
                    work_item_types: &["Product Backlog Item"],
                    area_path: Some(area),
                    ..tasks.clone()
                };
                vec![
                    tasks.clone(),
                    backlog("ContentAI\\Документация"),
                    backlog("ContentAI\\Design"),
                ]
            }
            Team::Is => vec![ItemFilter {
                scope: "NLC/AIS",
                state: "Closed",
                work_item_types: &["Bug", "Task"],
                area_path: None,
                excluded_project: None,
                honor_override: true,
                fetch_ancestors: false,
            }],
            Team::Lingvo => {
                let live = ItemFilter {
                    scope: "LingvoLive",
                    state: "Closed",
                    work_item_types: &["Bug", "Feature"],
                    area_path: None,
                    excluded_project: None,
                    honor_override: false,
                    fetch_ancestors: false,
                };
                vec![
                    ItemFilter {
                        scope: "Lingvo",
                        excluded_project: Some("lingvo.inbox"),
                        ..live.clone()
                    },
                    live,
                ]
            }
        }
    }

    /// Release bucket of an item; empty when unclassified.
    pub fn release(&self, item: &RawWorkItem, set: &WorkItemSet) -> String {
        match self {
            Team::Cai => cai_release(item, set),
            Team::Is => is_release(item),
            Team::Lingvo => lingvo_release(item),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Team {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Team::ALL
            .into_iter()
            .find(|team| team.as_str().eq_ignore_ascii_case(s))
        {
            Some(team) => Ok(team),
            None => bail!("Unknown team '{s}' (expected cai, is or lingvo)"),
        }
    }
}

/// Closest release code tagged on the item or one of its ancestors.
fn cai_release(item: &RawWorkItem, set: &WorkItemSet) -> String {
    set.lineage(item)
        .find_map(|node| rules::release_code(&node.text_or_empty(field::TAGS)).map(String::from))
        .unwrap_or_default()
}

fn is_release(item: &RawWorkItem) -> String {
    rules::ais_version(&item.text_or_empty(field::AREA_PATH))
        .map(|version| format!("IS_{version}"))
        .unwrap_or_default()
}

fn lingvo_release(item: &RawWorkItem) -> String {
    let path = item.text_or_empty(field::ITERATION_PATH);

    if let Some((project, version)) = rules::iteration_version(&path) {
        if let Some(code) = lookup(LINGVO_VERSIONED, project) {
            return format!("{code}_{version}");
        }
    }
    rules::leading_segment(&path)
        .and_then(|project| lookup(LINGVO_UNVERSIONED, project))
        .map(String::from)
        .unwrap_or_default()
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|&(_, code)| code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_tags(id: u32, tags: &str) -> RawWorkItem {
        RawWorkItem::new(id).with_field(field::TAGS, tags)
    }

    fn lingvo(path: &str) -> String {
        let item = RawWorkItem::new(1).with_field(field::ITERATION_PATH, path);
        Team::Lingvo.release(&item, &WorkItemSet::default())
    }

    #[test]
    fn parses_team_names() {
        assert_eq!("cai".parse::<Team>().unwrap(), Team::Cai);
        assert_eq!("IS".parse::<Team>().unwrap(), Team::Is);
        assert_eq!("Lingvo".parse::<Team>().unwrap(), Team::Lingvo);
        assert!("ops".parse::<Team>().is_err());
    }

    #[test]
    fn cai_filters_keep_query_order() {
        let filters = Team::Cai.filters();
        assert_eq!(filters.len(), 3);
        assert_eq!(filters[0].work_item_types, &["Task"]);
        assert_eq!(filters[0].area_path, None);
        assert_eq!(filters[1].area_path, Some("ContentAI\\Документация"));
        assert_eq!(filters[2].area_path, Some("ContentAI\\Design"));
        assert!(filters.iter().all(|f| f.fetch_ancestors && f.honor_override));
    }

    #[test]
    fn lingvo_filters_span_two_collections() {
        let filters = Team::Lingvo.filters();
        let scopes: Vec<&str> = filters.iter().map(|f| f.scope).collect();
        assert_eq!(scopes, vec!["Lingvo", "LingvoLive"]);
        assert_eq!(filters[0].excluded_project, Some("lingvo.inbox"));
        assert_eq!(filters[1].excluded_project, None);
        assert!(filters.iter().all(|f| !f.honor_override));
    }

    #[test]
    fn cai_release_on_item_itself() {
        let item = with_tags(1, "CAI_2.0.1");
        let set = WorkItemSet::new(vec![item.clone()]);
        assert_eq!(Team::Cai.release(&item, &set), "CAI_2.0.1");
    }

    #[test]
    fn cai_release_prefers_closest_ancestor() {
        let item = with_tags(3, "docs").with_parent(2);
        let set = WorkItemSet::new(vec![item.clone()]).with_ancestors(vec![
            with_tags(2, "FR_1.1.0").with_parent(1),
            with_tags(1, "CAI_9.9.9"),
        ]);
        assert_eq!(Team::Cai.release(&item, &set), "FR_1.1.0");
    }

    #[test]
    fn cai_release_reaches_root() {
        let item = RawWorkItem::new(3).with_parent(2);
        let set = WorkItemSet::new(vec![item.clone()]).with_ancestors(vec![
            RawWorkItem::new(2).with_parent(1),
            with_tags(1, "CAI_1.0.0"),
        ]);
        assert_eq!(Team::Cai.release(&item, &set), "CAI_1.0.0");
    }

    #[test]
    fn cai_release_empty_without_match() {
        let item = with_tags(2, "ui").with_parent(1);
        let set = WorkItemSet::new(vec![item.clone()]).with_ancestors(vec![with_tags(1, "")]);
        assert_eq!(Team::Cai.release(&item, &set), "");
    }

    #[test]
    fn cai_release_survives_cycles() {
        let item = with_tags(1, "a").with_parent(2);
        let set = WorkItemSet::new(vec![item.clone()])
            .with_ancestors(vec![with_tags(2, "b").with_parent(1)]);
        assert_eq!(Team::Cai.release(&item, &set), "");
        assert_eq!(Team::Cai.release(&item, &set), "");
    }

    #[test]
    fn is_release_from_area_path() {
        let item = RawWorkItem::new(1).with_field(field::AREA_PATH, "NLC\\AIS\\2.5\\Parser");
        assert_eq!(Team::Is.release(&item, &WorkItemSet::default()), "IS_2.5");
        let other = RawWorkItem::new(2).with_field(field::AREA_PATH, "NLC\\Backlog");
        assert_eq!(Team::Is.release(&other, &WorkItemSet::default()), "");
    }

    #[test]
    fn lingvo_versioned_projects() {
        assert_eq!(lingvo("Lingvo X6\\Sprint1\\1.2.3"), "LX6_1.2.3");
        assert_eq!(lingvo("lingvo.mac\\7.1"), "LFM_7.1");
    }

    #[test]
    fn lingvo_unversioned_fallback() {
        assert_eq!(lingvo("lingvo.live.web\\anything"), "LLWW");
        assert_eq!(lingvo("lingvo.live.services\\Sprint 4"), "LLB");
    }

    #[test]
    fn lingvo_versioned_path_outside_table_falls_back() {
        assert_eq!(lingvo("lingvo.live.web\\3.0"), "LLWW");
        assert_eq!(lingvo("Unknown\\1.0"), "");
    }

    #[test]
    fn lingvo_unmatched_paths() {
        assert_eq!(lingvo("Lingvo X6"), "");
        assert_eq!(lingvo(""), "");
    }
}
