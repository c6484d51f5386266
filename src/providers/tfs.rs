use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::WorkItemSource;
use crate::config::Connection;
use crate::filter::{DateRange, ItemFilter};
use crate::model::work_item::{field, RawWorkItem, WorkItemSet};

/// Server limit on ids per work-item batch request.
const BATCH_SIZE: usize = 200;

const PARENT_RELATION: &str = "System.LinkTypes.Hierarchy-Reverse";

/// Team Foundation Server / Azure DevOps REST client.
pub struct TfsSource {
    base_url: String,
    auth_header: String,
    api_version: String,
    client: reqwest::Client,
}

impl TfsSource {
    pub fn new(connection: Connection) -> Self {
        // PAT auth is basic auth with an empty user name
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(":{}", connection.pat));
        Self {
            base_url: connection.base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            api_version: connection.api_version,
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/{collection}/{project}` with each segment escaped.
    fn scope_url(&self, scope: &str) -> String {
        let segments: Vec<String> = scope
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}", self.base_url, segments.join("/"))
    }

    async fn run_wiql(&self, scope: &str, wiql: &str) -> Result<Vec<u32>> {
        let url = format!(
            "{}/_apis/wit/wiql?api-version={}",
            self.scope_url(scope),
            self.api_version
        );
        let body = serde_json::json!({ "query": wiql });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("WIQL request to {scope} failed"))?
            .error_for_status()
            .with_context(|| format!("WIQL query rejected by {scope}"))?;

        let result: WiqlResponse = resp
            .json()
            .await
            .context("Failed to parse WIQL response")?;
        Ok(result.work_items.into_iter().map(|r| r.id).collect())
    }

    async fn fetch_items(&self, scope: &str, ids: &[u32]) -> Result<Vec<RawWorkItem>> {
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_SIZE) {
            let id_list: Vec<String> = chunk.iter().map(u32::to_string).collect();
            let url = format!(
                "{}/_apis/wit/workitems?ids={}&$expand=all&api-version={}",
                self.scope_url(scope),
                id_list.join(","),
                self.api_version
            );

            let resp = self
                .client
                .get(&url)
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .send()
                .await
                .with_context(|| format!("Work item request to {scope} failed"))?
                .error_for_status()
                .with_context(|| format!("Work item request rejected by {scope}"))?;

            let batch: WorkItemsResponse = resp
                .json()
                .await
                .context("Failed to parse work items response")?;
            debug!(scope, count = batch.value.len(), "fetched work item batch");
            items.extend(batch.value.into_iter().map(RawWorkItem::from));
        }
        Ok(items)
    }

    /// Parents of `items`, their parents and so on, each fetched once.
    async fn fetch_ancestors(&self, scope: &str, items: &[RawWorkItem]) -> Result<Vec<RawWorkItem>> {
        let mut known: HashSet<u32> = items.iter().map(|i| i.id).collect();
        let mut pending = missing_parents(items, &known);
        let mut ancestors = Vec::new();

        while !pending.is_empty() {
            known.extend(pending.iter().copied());
            let fetched = self.fetch_items(scope, &pending).await?;
            pending = missing_parents(&fetched, &known);
            ancestors.extend(fetched);
        }
        Ok(ancestors)
    }
}

/// Parent ids referenced by `items` that are not in `known`, deduplicated in order.
fn missing_parents(items: &[RawWorkItem], known: &HashSet<u32>) -> Vec<u32> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|i| i.parent_id)
        .filter(|id| !known.contains(id) && seen.insert(*id))
        .collect()
}

#[async_trait]
impl WorkItemSource for TfsSource {
    fn name(&self) -> &str {
        "TFS"
    }

    async fn query(&self, filter: &ItemFilter, range: &DateRange) -> Result<WorkItemSet> {
        let wiql = filter.to_wiql(range);
        debug!(scope = filter.scope, %wiql, "running query");

        let ids = self.run_wiql(filter.scope, &wiql).await?;
        let items = self.fetch_items(filter.scope, &ids).await?;
        let ancestors = if filter.fetch_ancestors {
            self.fetch_ancestors(filter.scope, &items).await?
        } else {
            Vec::new()
        };

        info!(
            scope = filter.scope,
            items = items.len(),
            ancestors = ancestors.len(),
            "query finished"
        );
        Ok(WorkItemSet::new(items).with_ancestors(ancestors))
    }
}

#[derive(Deserialize)]
struct WiqlResponse {
    #[serde(rename = "workItems", default)]
    work_items: Vec<WorkItemRef>,
}

#[derive(Deserialize)]
struct WorkItemRef {
    id: u32,
}

#[derive(Deserialize)]
struct WorkItemsResponse {
    value: Vec<ApiWorkItem>,
}

#[derive(Deserialize)]
struct ApiWorkItem {
    id: u32,
    #[serde(default)]
    fields: HashMap<String, Value>,
    #[serde(default)]
    relations: Vec<Relation>,
    #[serde(rename = "_links")]
    links: Option<Links>,
}

#[derive(Deserialize)]
struct Relation {
    rel: String,
    url: String,
}

#[derive(Deserialize)]
struct Links {
    html: Option<Href>,
}

#[derive(Deserialize)]
struct Href {
    href: String,
}

/// Trailing numeric id of a work item resource URL.
fn id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

impl From<ApiWorkItem> for RawWorkItem {
    fn from(item: ApiWorkItem) -> Self {
        let parent_id = item
            .relations
            .iter()
            .find(|r| r.rel == PARENT_RELATION)
            .and_then(|r| id_from_url(&r.url))
            .or_else(|| {
                item.fields
                    .get(field::PARENT)
                    .and_then(Value::as_u64)
                    .and_then(|id| u32::try_from(id).ok())
            });

        RawWorkItem {
            id: item.id,
            fields: item.fields,
            link: item.links.and_then(|l| l.html).map(|h| h.href),
            parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base_url: &str) -> TfsSource {
        TfsSource::new(Connection {
            base_url: base_url.to_string(),
            pat: "token".to_string(),
            api_version: "5.0".to_string(),
        })
    }

    #[test]
    fn auth_header_uses_empty_user() {
        // base64(":token")
        assert_eq!(source("https://tfs/").auth_header, "Basic OnRva2Vu");
    }

    #[test]
    fn scope_url_escapes_segments() {
        let src = source("https://tfs.example.com/");
        assert_eq!(src.scope_url("HQ/ContentAI"), "https://tfs.example.com/HQ/ContentAI");
        assert_eq!(src.scope_url("Lingvo X6"), "https://tfs.example.com/Lingvo%20X6");
    }

    #[test]
    fn converts_api_item_with_parent_relation() {
        let json = r#"{
            "id": 42,
            "fields": {
                "System.Title": "Fix login",
                "System.AssignedTo": "Ivan Petrov <ivan@x.com>",
                "System.Tags": "CAI_1.2.3"
            },
            "relations": [
                {"rel": "System.LinkTypes.Related", "url": "https://tfs/_apis/wit/workItems/7"},
                {"rel": "System.LinkTypes.Hierarchy-Reverse", "url": "https://tfs/_apis/wit/workItems/17"}
            ],
            "_links": {"html": {"href": "https://tfs/web/wi.aspx?id=42"}}
        }"#;
        let api: ApiWorkItem = serde_json::from_str(json).unwrap();
        let item = RawWorkItem::from(api);

        assert_eq!(item.id, 42);
        assert_eq!(item.parent_id, Some(17));
        assert_eq!(item.link.as_deref(), Some("https://tfs/web/wi.aspx?id=42"));
        assert_eq!(item.text(field::TITLE).as_deref(), Some("Fix login"));
    }

    #[test]
    fn parent_falls_back_to_field() {
        let json = r#"{"id": 1, "fields": {"System.Parent": 9}}"#;
        let item = RawWorkItem::from(serde_json::from_str::<ApiWorkItem>(json).unwrap());
        assert_eq!(item.parent_id, Some(9));
        assert_eq!(item.link, None);
    }

    #[test]
    fn wiql_response_without_items() {
        let resp: WiqlResponse = serde_json::from_str(r#"{"queryType": "flat"}"#).unwrap();
        assert!(resp.work_items.is_empty());
    }

    #[test]
    fn missing_parents_skips_known_and_duplicates() {
        let items = vec![
            RawWorkItem::new(1).with_parent(10),
            RawWorkItem::new(2).with_parent(10),
            RawWorkItem::new(3).with_parent(1),
            RawWorkItem::new(4),
        ];
        let known: HashSet<u32> = [1, 2, 3, 4].into_iter().collect();
        assert_eq!(missing_parents(&items, &known), vec![10]);
    }

    #[test]
    fn id_from_url_handles_trailing_slash() {
        assert_eq!(id_from_url("https://tfs/_apis/wit/workItems/17/"), Some(17));
        assert_eq!(id_from_url("https://tfs/_apis/wit/workItems/x"), None);
    }
}
