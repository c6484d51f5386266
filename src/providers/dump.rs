use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use super::WorkItemSource;
use crate::filter::{DateRange, ItemFilter};
use crate::model::work_item::{RawWorkItem, WorkItemSet};

/// Work items exported to a JSON file, keyed by query scope:
///
/// ```json
/// { "HQ/ContentAI": [ { "id": 1, "fields": { "System.Title": "..." } } ] }
/// ```
pub struct DumpSource {
    scopes: HashMap<String, Vec<RawWorkItem>>,
}

impl DumpSource {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read work item dump {}", path.display()))?;
        let scopes: HashMap<String, Vec<RawWorkItem>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse work item dump {}", path.display()))?;
        info!(
            path = %path.display(),
            scopes = scopes.len(),
            "loaded work item dump"
        );
        Ok(Self::from_scopes(scopes))
    }

    pub fn from_scopes(scopes: HashMap<String, Vec<RawWorkItem>>) -> Self {
        Self { scopes }
    }
}

#[async_trait]
impl WorkItemSource for DumpSource {
    fn name(&self) -> &str {
        "dump"
    }

    async fn query(&self, filter: &ItemFilter, range: &DateRange) -> Result<WorkItemSet> {
        let Some(all) = self.scopes.get(filter.scope) else {
            debug!(scope = filter.scope, "scope not present in dump");
            return Ok(WorkItemSet::default());
        };

        let matched: Vec<RawWorkItem> = all
            .iter()
            .filter(|item| filter.matches(item, range))
            .cloned()
            .collect();
        let set = WorkItemSet::new(matched);
        debug!(scope = filter.scope, matched = set.len(), "filtered dump");
        if filter.fetch_ancestors {
            Ok(set.with_ancestors(all.iter().cloned()))
        } else {
            Ok(set)
        }
    }
}
