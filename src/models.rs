//! Data models for the sprint report.
//!
//! Raw records come from the task tracker, one per (task, assignee) pair.
//! They are folded into per-sprint aggregates, normalized against the top
//! contributor of each sprint and finally assembled into a [`Report`].

use crate::error::{Result, SprintError};
use indexmap::IndexMap;
use serde_json::Value;

/// Assignee name used for tasks nobody is assigned to.
pub const UNASSIGNED: &str = "Unassigned";

/// Sprint name that is never part of the normalized report.
pub const PRODUCT_BACKLOG: &str = "Product Backlog";

/// Task status (compared case-insensitively) that counts as delivered.
pub const COMPLETE_STATUS: &str = "complete";

/// One task/assignee fact pulled from the task tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Name of the list (sprint) the task belongs to.
    pub sprint_name: String,
    /// Username of the assignee, or [`UNASSIGNED`].
    pub assignee: String,
    /// Task title. Tasks are identified by title within a sprint.
    pub task_title: String,
    /// Tracker task id.
    pub task_id: String,
    /// Time estimate in hours, never negative.
    pub time_estimate_hours: f64,
    /// Tracker status name, e.g. "complete", "in progress".
    pub task_status: String,
}

impl RawRecord {
    pub fn new(
        sprint_name: impl ToString,
        assignee: impl ToString,
        task_title: impl ToString,
        task_id: impl ToString,
        time_estimate_hours: f64,
        task_status: impl ToString,
    ) -> Self {
        Self {
            sprint_name: sprint_name.to_string(),
            assignee: assignee.to_string(),
            task_title: task_title.to_string(),
            task_id: task_id.to_string(),
            time_estimate_hours,
            task_status: task_status.to_string(),
        }
    }

    /// Whether the task status counts as delivered.
    pub fn is_complete(&self) -> bool {
        self.task_status.to_lowercase() == COMPLETE_STATUS
    }

    /// Parse a JSON array of raw record objects.
    pub fn parse_all(json_str: &str) -> Result<Vec<Self>> {
        let elements: Vec<Value> = serde_json::from_str(json_str)?;
        elements
            .iter()
            .enumerate()
            .map(|(index, value)| Self::from_value(index, value))
            .collect()
    }

    /// Build a record from one JSON object, failing on any missing field
    /// except the time estimate, which defaults to zero.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(SprintError::invalid(index, "record", "is not a JSON object"));
        }

        let text = |field: &'static str| -> Result<String> {
            match &value[field] {
                Value::String(s) => Ok(s.clone()),
                Value::Null => Err(SprintError::missing(index, field)),
                _ => Err(SprintError::invalid(index, field, "is not a string")),
            }
        };

        let task_id = match &value["task_id"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Null => return Err(SprintError::missing(index, "task_id")),
            _ => {
                return Err(SprintError::invalid(
                    index,
                    "task_id",
                    "is not a string or number",
                ))
            }
        };

        let time_estimate_hours = match &value["time_estimate_hours"] {
            Value::Null => 0.0,
            Value::Number(n) => match n.as_f64() {
                Some(hours) if hours >= 0.0 => hours,
                _ => {
                    return Err(SprintError::invalid(
                        index,
                        "time_estimate_hours",
                        "is negative",
                    ))
                }
            },
            _ => {
                return Err(SprintError::invalid(
                    index,
                    "time_estimate_hours",
                    "is not a number",
                ))
            }
        };

        Ok(Self {
            sprint_name: text("sprint_name")?,
            assignee: text("assignee")?,
            task_title: text("task_title")?,
            task_id,
            time_estimate_hours,
            task_status: text("task_status")?,
        })
    }
}

/// Per-assignee totals within one sprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssigneeRecord {
    /// Unique task titles assigned to this person, first-seen order.
    pub assigned_tasks: Vec<String>,
    /// Hours of completed tasks, each title counted once.
    pub completed_points: f64,
    /// Share of the sprint's committed points, in percent.
    pub completion_pct: f64,
}

impl AssigneeRecord {
    pub fn is_finite(&self) -> bool {
        self.completed_points.is_finite() && self.completion_pct.is_finite()
    }
}

/// A sprint folded from raw records, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SprintAggregate {
    pub name: String,
    /// Unique assignees, first-seen order.
    pub assignees: Vec<String>,
    /// Unique task titles, first-seen order.
    pub unique_task_titles: Vec<String>,
    /// Sum of estimates over unique task titles.
    pub committed_points: f64,
    pub per_assignee: IndexMap<String, AssigneeRecord>,
}

impl SprintAggregate {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            assignees: Vec::new(),
            unique_task_titles: Vec::new(),
            committed_points: 0.0,
            per_assignee: IndexMap::new(),
        }
    }

    /// Whether this is the product backlog rather than a real sprint.
    pub fn is_backlog(&self) -> bool {
        self.name == PRODUCT_BACKLOG
    }

    /// False once summed estimates overflowed to infinity or NaN.
    pub fn is_finite(&self) -> bool {
        self.committed_points.is_finite()
            && self.per_assignee.values().all(AssigneeRecord::is_finite)
    }
}

/// A sprint rescaled against its top contributor.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSprint {
    pub name: String,
    pub assignees: Vec<String>,
    /// Completed points of the max contributor, or the original committed
    /// total when nobody completed anything.
    pub committed_points: f64,
    /// The max contributor's tasks, or the sprint's unique titles.
    pub reference_task_list: Vec<String>,
    /// Roster members with no task in this sprint, sorted.
    pub unassigned_members: Vec<String>,
    pub per_assignee: IndexMap<String, AssigneeRecord>,
    /// Assignee with the highest completed points, if anyone completed work.
    pub max_contributor: Option<String>,
}

impl NormalizedSprint {
    pub fn is_finite(&self) -> bool {
        self.committed_points.is_finite()
            && self.per_assignee.values().all(AssigneeRecord::is_finite)
    }
}

/// The assembled report: global roster plus every normalized sprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Every assignee ever seen, deduplicated and sorted.
    pub team_roster: Vec<String>,
    /// Normalized sprints in first-appearance order.
    pub sprints: Vec<NormalizedSprint>,
}

impl Report {
    /// Number of (sprint, assignee) rows in the report.
    pub fn assignment_count(&self) -> usize {
        self.sprints.iter().map(|s| s.per_assignee.len()).sum()
    }

    /// First sprint whose figures overflowed, if any.
    pub fn first_non_finite(&self) -> Option<&NormalizedSprint> {
        self.sprints.iter().find(|sprint| !sprint.is_finite())
    }
}
