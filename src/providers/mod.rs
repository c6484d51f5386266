pub mod dump;
pub mod tfs;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::config;
use crate::filter::{DateRange, ItemFilter};
use crate::model::work_item::WorkItemSet;

/// Where raw work items come from.
#[async_trait]
pub trait WorkItemSource: Send + Sync {
    fn name(&self) -> &str;
    /// Items matching `filter` closed within `range`, in tracker order.
    /// Failures are passed through untouched; there are no retries.
    async fn query(&self, filter: &ItemFilter, range: &DateRange) -> Result<WorkItemSet>;
}


/// A dump file when one is given, otherwise the configured tracker.
pub fn create_source(input: Option<&Path>) -> Result<Box<dyn WorkItemSource>> {
    if let Some(path) = input {
        return Ok(Box::new(dump::DumpSource::load(path)?));
    }
    let connection = config::load_config()?.connection()?;
    Ok(Box::new(tfs::TfsSource::new(connection)))
}
