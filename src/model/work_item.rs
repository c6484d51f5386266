use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Reference names of the upstream fields the report reads.
pub mod field {
    pub const TITLE: &str = "System.Title";
    pub const ASSIGNED_TO: &str = "System.AssignedTo";
    pub const TAGS: &str = "System.Tags";
    pub const CREATED_DATE: &str = "System.CreatedDate";
    pub const CLOSED_DATE: &str = "Microsoft.VSTS.Common.ClosedDate";
    pub const CLOSED_DATE_OVERRIDE: &str = "Custom.ClosedDateOverride";
    pub const AREA_PATH: &str = "System.AreaPath";
    pub const ITERATION_PATH: &str = "System.IterationPath";
    pub const STATE: &str = "System.State";
    pub const WORK_ITEM_TYPE: &str = "System.WorkItemType";
    pub const TEAM_PROJECT: &str = "System.TeamProject";
    pub const PARENT: &str = "System.Parent";
}

/// A work item as returned by the tracker. Read-only for everything downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWorkItem {
    pub id: u32,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    /// Browser link to the item (`_links.html.href` upstream)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
}

#[cfg(test)]
impl RawWorkItem {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    pub fn with_parent(mut self, parent_id: u32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

impl RawWorkItem {
    /// Field lookup by reference name. Upstream casing is inconsistent
    /// (`System.AreaPath` vs `system.areapath`), so fall back to a
    /// case-insensitive scan.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Field value rendered as text. Identity objects become
    /// `"Display Name <unique name>"`, the form older servers send as a plain string.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => {
                let display = obj.get("displayName").and_then(Value::as_str)?;
                match obj.get("uniqueName").and_then(Value::as_str) {
                    Some(unique) => Some(format!("{display} <{unique}>")),
                    None => Some(display.to_string()),
                }
            }
            other => Some(other.to_string()),
        }
    }

    /// Like [`text`](Self::text) but absent fields read as empty.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }
}

/// The in-scope items of one query, in query order, plus whatever ancestors
/// were fetched to resolve parent references.
#[derive(Debug, Default)]
pub struct WorkItemSet {
    items: Vec<RawWorkItem>,
    index: HashMap<u32, usize>,
    ancestors: HashMap<u32, RawWorkItem>,
}

impl WorkItemSet {
    pub fn new(items: Vec<RawWorkItem>) -> Self {
        let mut index = HashMap::new();
        for (pos, item) in items.iter().enumerate() {
            index.entry(item.id).or_insert(pos);
        }
        Self {
            items,
            index,
            ancestors: HashMap::new(),
        }
    }

    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = RawWorkItem>) -> Self {
        for item in ancestors {
            self.ancestors.entry(item.id).or_insert(item);
        }
        self
    }

    pub fn items(&self) -> &[RawWorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&RawWorkItem> {
        self.index
            .get(&id)
            .map(|&pos| &self.items[pos])
            .or_else(|| self.ancestors.get(&id))
    }

    pub fn parent_of(&self, item: &RawWorkItem) -> Option<&RawWorkItem> {
        self.get(item.parent_id?)
    }

    /// The item followed by its ancestors, closest first.
    pub fn lineage<'a>(&'a self, item: &'a RawWorkItem) -> Lineage<'a> {
        Lineage {
            set: self,
            next: Some(item),
            seen: HashSet::new(),
        }
    }
}

/// Iterator over an item's parent chain. Stops at the root, at a parent that
/// was never fetched, or when an id repeats.
pub struct Lineage<'a> {
    set: &'a WorkItemSet,
    next: Option<&'a RawWorkItem>,
    seen: HashSet<u32>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a RawWorkItem;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.seen.insert(current.id) {
            warn!(id = current.id, "parent chain loops back on itself");
            return None;
        }
        self.next = self.set.parent_of(current);
        Some(current)
    }
}
