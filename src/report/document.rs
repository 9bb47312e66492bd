//! Persisted document shapes.
//!
//! These mirror the JSON served to report consumers: sprints are a list of
//! single-key objects `{ "<sprint name>": { ... } }` and per-assignee data is
//! keyed by assignee name, in insertion order.

use crate::analysis::SprintAggregates;
use crate::models::{AssigneeRecord, NormalizedSprint, Report, SprintAggregate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One `{ "<sprint name>": SprintDocument }` entry.
pub type SprintEntry = IndexMap<String, SprintDocument>;

/// The final report as persisted and served.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Sorted team roster.
    pub team_info: Vec<String>,
    pub sprints: Vec<SprintEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintDocument {
    pub list_of_assignees: Vec<String>,
    pub committed_story_points: f64,
    pub list_of_unique_tasks_titles: Vec<String>,
    /// Only present for sprints normalized against a max contributor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_assigned_tasks_for: Option<Vec<String>>,
    pub delivered_story_points: IndexMap<String, AssigneeDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssigneeDocument {
    pub list_of_assigned_tasks: Vec<String>,
    pub completed_story_points: f64,
    pub percentage_of_completion: f64,
}

impl From<&AssigneeRecord> for AssigneeDocument {
    fn from(record: &AssigneeRecord) -> Self {
        Self {
            list_of_assigned_tasks: record.assigned_tasks.clone(),
            completed_story_points: record.completed_points,
            percentage_of_completion: record.completion_pct,
        }
    }
}

fn delivered(per_assignee: &IndexMap<String, AssigneeRecord>) -> IndexMap<String, AssigneeDocument> {
    per_assignee
        .iter()
        .map(|(name, record)| (name.clone(), AssigneeDocument::from(record)))
        .collect()
}

impl From<&NormalizedSprint> for SprintDocument {
    fn from(sprint: &NormalizedSprint) -> Self {
        Self {
            list_of_assignees: sprint.assignees.clone(),
            committed_story_points: sprint.committed_points,
            list_of_unique_tasks_titles: sprint.reference_task_list.clone(),
            no_assigned_tasks_for: sprint
                .max_contributor
                .as_ref()
                .map(|_| sprint.unassigned_members.clone()),
            delivered_story_points: delivered(&sprint.per_assignee),
        }
    }
}

impl From<&SprintAggregate> for SprintDocument {
    fn from(sprint: &SprintAggregate) -> Self {
        Self {
            list_of_assignees: sprint.assignees.clone(),
            committed_story_points: sprint.committed_points,
            list_of_unique_tasks_titles: sprint.unique_task_titles.clone(),
            no_assigned_tasks_for: None,
            delivered_story_points: delivered(&sprint.per_assignee),
        }
    }
}

impl From<&Report> for ReportDocument {
    fn from(report: &Report) -> Self {
        Self {
            team_info: report.team_roster.clone(),
            sprints: report
                .sprints
                .iter()
                .map(|sprint| single_entry(&sprint.name, SprintDocument::from(sprint)))
                .collect(),
        }
    }
}

/// The pre-normalization aggregates in the same sprint-list shape.
pub fn aggregates_document(sprints: &SprintAggregates) -> Vec<SprintEntry> {
    sprints
        .values()
        .map(|sprint| single_entry(&sprint.name, SprintDocument::from(sprint)))
        .collect()
}

fn single_entry(name: &str, document: SprintDocument) -> SprintEntry {
    let mut entry = IndexMap::with_capacity(1);
    entry.insert(name.to_string(), document);
    entry
}

impl ReportDocument {
    /// Iterate over `(sprint name, sprint)` pairs in report order.
    pub fn iter_sprints(&self) -> impl Iterator<Item = (&String, &SprintDocument)> {
        self.sprints.iter().flat_map(|entry| entry.iter())
    }
}
