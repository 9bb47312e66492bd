//! Persistence of refresh results.
//!
//! Every file is replaced atomically: content goes to a temporary file in
//! the data directory which is then renamed over the target, so readers
//! only ever see a complete previous or complete new version.

use crate::analysis::SprintAggregates;
use crate::error::{Result, SprintError};
use crate::report::{aggregates_document, generate_csv_report, generate_json_report, ReportDocument};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const AGGREGATES_FILE: &str = "all_sprints_data.json";
pub const CSV_FILE: &str = "sprints_data.csv";
pub const REPORT_FILE: &str = "transformed_sprints_data.json";

/// Reads and writes the refresh artifacts inside one data directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    data_dir: PathBuf,
}

/// Rendered content of one refresh, ready to be written.
struct Artifacts {
    report_json: String,
    aggregates_json: String,
    csv: String,
}

impl ReportStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILE)
    }

    /// Persist one refresh: the final report, the pre-normalization
    /// aggregates and their CSV export.
    ///
    /// Everything is rendered and staged before anything is replaced. The
    /// report is replaced first; if that fails no file changes. The
    /// aggregates and CSV follow and a failure there is only logged.
    pub async fn save(&self, sprints: &SprintAggregates, document: &ReportDocument) -> Result<()> {
        let artifacts = Artifacts {
            report_json: generate_json_report(document)?,
            aggregates_json: generate_json_report(&aggregates_document(sprints))?,
            csv: generate_csv_report(sprints)?,
        };

        let store = self.clone();
        tokio::task::spawn_blocking(move || store.commit(artifacts))
            .await
            .map_err(|e| SprintError::Io(std::io::Error::new(ErrorKind::Other, e)))?
    }

    /// Load the persisted report.
    ///
    /// Returns `Ok(None)` if no report has been written yet.
    pub async fn load_report(&self) -> Result<Option<ReportDocument>> {
        let content = match tokio::fs::read_to_string(self.report_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }

    fn commit(&self, artifacts: Artifacts) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;

        let report = self.stage(artifacts.report_json.as_bytes())?;
        let aggregates = self.stage(artifacts.aggregates_json.as_bytes())?;
        let csv = self.stage(artifacts.csv.as_bytes())?;

        self.persist(report, REPORT_FILE)?;

        for (temp, file_name) in [(aggregates, AGGREGATES_FILE), (csv, CSV_FILE)] {
            if let Err(e) = self.persist(temp, file_name) {
                warn!("Report saved but {} was not updated: {}", file_name, e);
            }
        }

        Ok(())
    }

    fn stage(&self, content: &[u8]) -> Result<NamedTempFile> {
        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(content)?;
        temp.flush()?;
        Ok(temp)
    }

    fn persist(&self, temp: NamedTempFile, file_name: &str) -> Result<()> {
        let target = self.data_dir.join(file_name);
        temp.persist(&target).map_err(|e| e.error)?;
        debug!("Wrote {}", target.display());
        Ok(())
    }
}
