//! Raw record collection.
//!
//! A [`RecordSource`] produces the flat (sprint, assignee, task) feed the
//! analysis pipeline consumes: either live from ClickUp or from a JSON file
//! of previously exported records.

pub mod clickup;

use crate::error::Result;
use crate::models::RawRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

pub use clickup::{ClickUpCollector, CollectorConfig};

/// Anything that can produce a full raw record feed.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record, in feed order.
    async fn fetch_records(&self) -> Result<Vec<RawRecord>>;

    /// Short label used in logs.
    fn describe(&self) -> String;
}

/// Reads raw records from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        info!("Reading raw records from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await?;
        RawRecord::parse_all(&content)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
