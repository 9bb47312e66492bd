//! Completion normalization.
//!
//! "100% complete" is redefined as matching the sprint's top contributor:
//! committed points become that contributor's completed points and every
//! assignee's percentage is recomputed against it.

use crate::models::{NormalizedSprint, SprintAggregate};
use tracing::debug;

/// Assignee with the highest completed points, if anyone completed work.
/// The first maximum in insertion order wins ties.
pub fn find_max_contributor(sprint: &SprintAggregate) -> Option<&str> {
    let mut max_points = 0.0;
    let mut max_member = None;

    for (member, record) in &sprint.per_assignee {
        if record.completed_points > max_points {
            max_points = record.completed_points;
            max_member = Some(member.as_str());
        }
    }

    max_member
}

/// Roster members without any task in the sprint, sorted ascending.
pub fn unassigned_members(roster: &[String], assignees: &[String]) -> Vec<String> {
    let mut members: Vec<String> = roster
        .iter()
        .filter(|member| !assignees.contains(member))
        .cloned()
        .collect();
    members.sort();
    members.dedup();
    members
}

/// Normalize one sprint against its max contributor.
///
/// Returns `None` for the product backlog, which never appears in reports.
/// Sprints where nobody completed anything keep their committed total,
/// task list and first-pass percentages.
pub fn normalize_sprint(sprint: SprintAggregate, roster: &[String]) -> Option<NormalizedSprint> {
    if sprint.is_backlog() {
        debug!("Dropping '{}' from the report", sprint.name);
        return None;
    }

    let max_contributor = find_max_contributor(&sprint).map(String::from);
    let unassigned = unassigned_members(roster, &sprint.assignees);

    let SprintAggregate {
        name,
        assignees,
        unique_task_titles,
        committed_points,
        mut per_assignee,
    } = sprint;

    let Some(max_member) = max_contributor else {
        return Some(NormalizedSprint {
            name,
            assignees,
            committed_points,
            reference_task_list: unique_task_titles,
            unassigned_members: unassigned,
            per_assignee,
            max_contributor: None,
        });
    };

    let (max_points, reference_task_list) = match per_assignee.get(&max_member) {
        Some(record) => (record.completed_points, record.assigned_tasks.clone()),
        None => (committed_points, unique_task_titles),
    };

    for record in per_assignee.values_mut() {
        record.completion_pct = if max_points > 0.0 {
            (record.completed_points / max_points) * 100.0
        } else {
            0.0
        };
    }

    debug!(
        "Sprint '{}': max contributor {} with {} points",
        name, max_member, max_points
    );

    Some(NormalizedSprint {
        name,
        assignees,
        committed_points: max_points,
        reference_task_list,
        unassigned_members: unassigned,
        per_assignee,
        max_contributor: Some(max_member),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::aggregate_sprints;
    use crate::models::RawRecord;

    fn record(sprint: &str, assignee: &str, title: &str, hours: f64, status: &str) -> RawRecord {
        RawRecord::new(sprint, assignee, title, format!("id-{title}"), hours, status)
    }

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn single_sprint(records: &[RawRecord]) -> SprintAggregate {
        aggregate_sprints(records)
            .into_iter()
            .next()
            .map(|(_, sprint)| sprint)
            .unwrap()
    }

    #[test]
    fn test_scenario_single_max_contributor() {
        let sprint = single_sprint(&[
            record("S1", "A", "T1", 4.0, "complete"),
            record("S1", "B", "T2", 2.0, "open"),
        ]);

        let normalized = normalize_sprint(sprint, &roster(&["A", "B"])).unwrap();

        assert_eq!(normalized.max_contributor.as_deref(), Some("A"));
        assert_eq!(normalized.committed_points, 4.0);
        assert_eq!(normalized.per_assignee["A"].completion_pct, 100.0);
        assert_eq!(normalized.per_assignee["B"].completion_pct, 0.0);
        assert!(normalized.unassigned_members.is_empty());
        assert_eq!(normalized.reference_task_list, vec!["T1"]);
    }

    #[test]
    fn test_percentages_relative_to_max_contributor() {
        let sprint = single_sprint(&[
            record("S1", "A", "T1", 8.0, "complete"),
            record("S1", "B", "T2", 2.0, "complete"),
            record("S1", "B", "T3", 10.0, "open"),
        ]);

        let normalized = normalize_sprint(sprint, &roster(&["A", "B"])).unwrap();

        assert_eq!(normalized.committed_points, 8.0);
        assert_eq!(normalized.per_assignee["A"].completion_pct, 100.0);
        assert_eq!(normalized.per_assignee["B"].completion_pct, 25.0);
    }

    #[test]
    fn test_tie_first_maximum_wins() {
        let sprint = single_sprint(&[
            record("S1", "B", "T1", 3.0, "complete"),
            record("S1", "A", "T2", 3.0, "complete"),
        ]);

        assert_eq!(find_max_contributor(&sprint), Some("B"));
        let normalized = normalize_sprint(sprint, &roster(&["A", "B"])).unwrap();
        assert_eq!(normalized.reference_task_list, vec!["T1"]);
    }

    #[test]
    fn test_no_max_contributor_passes_through() {
        let sprint = single_sprint(&[
            record("S1", "A", "T1", 4.0, "open"),
            record("S1", "B", "T2", 2.0, "in progress"),
        ]);

        let normalized = normalize_sprint(sprint, &roster(&["A", "B", "C"])).unwrap();

        assert!(normalized.max_contributor.is_none());
        assert_eq!(normalized.committed_points, 6.0);
        assert_eq!(normalized.reference_task_list, vec!["T1", "T2"]);
        assert!(normalized
            .per_assignee
            .values()
            .all(|r| r.completion_pct == 0.0));
        assert_eq!(normalized.unassigned_members, vec!["C"]);
    }

    #[test]
    fn test_zero_hour_completion_is_not_a_max() {
        let sprint = single_sprint(&[record("S1", "A", "T1", 0.0, "complete")]);
        assert_eq!(find_max_contributor(&sprint), None);
    }

    #[test]
    fn test_product_backlog_dropped() {
        let sprint = single_sprint(&[record("Product Backlog", "A", "T1", 4.0, "complete")]);
        assert!(normalize_sprint(sprint, &roster(&["A"])).is_none());
    }

    #[test]
    fn test_unassigned_members_sorted() {
        let members = unassigned_members(
            &roster(&["Unassigned", "bob", "carol", "alice"]),
            &roster(&["carol"]),
        );
        assert_eq!(members, vec!["Unassigned", "alice", "bob"]);
    }
}
