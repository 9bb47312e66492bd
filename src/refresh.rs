//! One full refresh cycle: fetch, transform, persist.

use crate::analysis::{aggregate_sprints, assemble_report};
use crate::collector::RecordSource;
use crate::error::{Result, SprintError};
use crate::report::ReportDocument;
use crate::storage::ReportStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    /// Raw records fetched.
    pub records: usize,
    /// Sprints in the final report (product backlog excluded).
    pub sprints: usize,
    /// Size of the team roster.
    pub team_members: usize,
    /// (sprint, assignee) rows across the report.
    pub assignments: usize,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// Runs refresh cycles against one source and one store.
///
/// Cycles are serialized: a refresh requested while another is running
/// waits for it to finish and then runs its own.
pub struct Refresher {
    source: Arc<dyn RecordSource>,
    store: ReportStore,
    running: Mutex<()>,
    last: RwLock<Option<RefreshSummary>>,
}

impl Refresher {
    pub fn new(source: Arc<dyn RecordSource>, store: ReportStore) -> Self {
        Self {
            source,
            store,
            running: Mutex::new(()),
            last: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Summary of the most recent successful refresh.
    pub async fn last_refresh(&self) -> Option<RefreshSummary> {
        self.last.read().await.clone()
    }

    /// Fetch the raw feed and replace every persisted artifact.
    ///
    /// Nothing is written if fetching fails or if any figure overflows.
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let _guard = self.running.lock().await;
        let start_time = Instant::now();

        info!("Refreshing sprints data from {}", self.source.describe());
        let records = self.source.fetch_records().await?;
        debug!("Fetched {} raw records", records.len());

        let aggregates = aggregate_sprints(&records);
        if let Some(sprint) = aggregates.values().find(|sprint| !sprint.is_finite()) {
            return Err(SprintError::NonFinite {
                sprint: sprint.name.clone(),
            });
        }

        let report = assemble_report(aggregates.clone());
        if let Some(sprint) = report.first_non_finite() {
            return Err(SprintError::NonFinite {
                sprint: sprint.name.clone(),
            });
        }

        let document = ReportDocument::from(&report);
        self.store.save(&aggregates, &document).await?;

        let summary = RefreshSummary {
            records: records.len(),
            sprints: report.sprints.len(),
            team_members: report.team_roster.len(),
            assignments: report.assignment_count(),
            completed_at: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        };

        info!(
            "Refresh complete: {} records, {} sprints, {} team members in {:.2}s",
            summary.records, summary.sprints, summary.team_members, summary.duration_seconds
        );

        *self.last.write().await = Some(summary.clone());
        Ok(summary)
    }
}
