//! Report assembly: roster plus normalized sprints, in feed order.

use crate::analysis::aggregator::{collect_team_roster, SprintAggregates};
use crate::analysis::normalizer::normalize_sprint;
use crate::models::Report;

/// Normalize every sprint and attach the global roster.
///
/// The roster is taken before the product backlog is dropped, so backlog
/// assignees still count as team members.
pub fn assemble_report(sprints: SprintAggregates) -> Report {
    let team_roster = collect_team_roster(&sprints);

    let sprints = sprints
        .into_values()
        .filter_map(|sprint| normalize_sprint(sprint, &team_roster))
        .collect();

    Report {
        team_roster,
        sprints,
    }
}
