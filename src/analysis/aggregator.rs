//! Sprint aggregation.
//!
//! Folds the flat raw record feed into one [`SprintAggregate`] per sprint,
//! in a single pass, preserving first-appearance order everywhere.

use crate::models::{AssigneeRecord, RawRecord, SprintAggregate};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Sprint aggregates keyed by sprint name, in first-appearance order.
pub type SprintAggregates = IndexMap<String, SprintAggregate>;

/// Group raw records by sprint and assignee.
///
/// A task title contributes to the sprint's committed points the first time
/// it appears anywhere in the sprint. It contributes to an assignee's
/// completed points the first time it appears for that assignee, and only if
/// that first occurrence is complete.
pub fn aggregate_sprints(records: &[RawRecord]) -> SprintAggregates {
    let mut sprints: SprintAggregates = IndexMap::new();
    // Titles seen per sprint, and per (sprint, assignee).
    let mut sprint_titles: HashSet<(&str, &str)> = HashSet::new();
    let mut assignee_titles: HashSet<(&str, &str, &str)> = HashSet::new();

    for record in records {
        let sprint = sprints
            .entry(record.sprint_name.clone())
            .or_insert_with(|| SprintAggregate::new(&record.sprint_name));

        if !sprint.per_assignee.contains_key(&record.assignee) {
            sprint.assignees.push(record.assignee.clone());
            sprint
                .per_assignee
                .insert(record.assignee.clone(), AssigneeRecord::default());
        }

        if sprint_titles.insert((&record.sprint_name, &record.task_title)) {
            sprint.unique_task_titles.push(record.task_title.clone());
            sprint.committed_points += record.time_estimate_hours;
        }

        if assignee_titles.insert((&record.sprint_name, &record.assignee, &record.task_title)) {
            if let Some(assignee) = sprint.per_assignee.get_mut(&record.assignee) {
                assignee.assigned_tasks.push(record.task_title.clone());
                if record.is_complete() {
                    assignee.completed_points += record.time_estimate_hours;
                }
            }
        }
    }

    for sprint in sprints.values_mut() {
        apply_committed_percentages(sprint);
    }

    sprints
}

/// First-pass completion percentages, relative to the committed total.
/// They stay at zero when nothing was committed.
fn apply_committed_percentages(sprint: &mut SprintAggregate) {
    let committed = sprint.committed_points;
    if committed > 0.0 {
        for assignee in sprint.per_assignee.values_mut() {
            assignee.completion_pct = (assignee.completed_points / committed) * 100.0;
        }
    }
}

/// Every assignee of every sprint, deduplicated and sorted ascending.
pub fn collect_team_roster(sprints: &SprintAggregates) -> Vec<String> {
    let mut roster: Vec<String> = sprints
        .values()
        .flat_map(|sprint| sprint.assignees.iter().cloned())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect();
    roster.sort();
    roster
}
