//! Report rendering.
//!
//! JSON for the persisted documents, CSV for spreadsheet export and a
//! self-contained HTML page for the browser view.

use crate::analysis::SprintAggregates;
use crate::error::Result;
use crate::report::document::{ReportDocument, SprintDocument};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Serialize any document as pretty-printed JSON.
pub fn generate_json_report<T: Serialize + ?Sized>(document: &T) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(Into::into)
}

/// Completed points per (sprint, assignee), all sprints included.
///
/// Points keep their decimal point (`4.0`, not `4`).
pub fn generate_csv_report(sprints: &SprintAggregates) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Sprint", "Team Member", "Story Points Delivered"])?;

    for sprint in sprints.values() {
        for (assignee, record) in &sprint.per_assignee {
            let points = format!("{:?}", record.completed_points);
            writer.write_record([sprint.name.as_str(), assignee.as_str(), points.as_str()])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Generate the complete HTML report page.
pub fn generate_html_report(document: &ReportDocument, generated_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    output.push_str(&generate_header());
    output.push_str("<h1>Sprints Report</h1>\n");
    output.push_str(&generate_team_section(&document.team_info));

    if document.sprints.is_empty() {
        output.push_str("<p class=\"empty\">No sprints found.</p>\n");
    }

    for (name, sprint) in document.iter_sprints() {
        output.push_str(&generate_sprint_section(name, sprint));
    }

    output.push_str(&generate_footer(generated_at));

    output
}

/// Page shown before the first refresh has produced a report.
pub fn generate_placeholder_page() -> String {
    let mut output = String::new();

    output.push_str(&generate_header());
    output.push_str("<h1>Sprints Report</h1>\n");
    output.push_str(
        "<p class=\"empty\">No report yet. Trigger a refresh with <a href=\"/reload\">/reload</a>.</p>\n",
    );
    output.push_str("</body>\n</html>\n");

    output
}

fn generate_header() -> String {
    let mut header = String::new();

    header.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    header.push_str("<meta charset=\"utf-8\">\n");
    header.push_str("<title>Sprints Report</title>\n");
    header.push_str("<style>\n");
    header.push_str("body { font-family: sans-serif; margin: 2rem; color: #222; }\n");
    header.push_str("table { border-collapse: collapse; margin-bottom: 1rem; }\n");
    header.push_str("th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }\n");
    header.push_str("th { background: #f3f3f3; }\n");
    header.push_str(".max { font-weight: bold; }\n");
    header.push_str(".empty, footer { color: #777; }\n");
    header.push_str("</style>\n</head>\n<body>\n");

    header
}

fn generate_team_section(team: &[String]) -> String {
    let mut section = String::new();

    section.push_str("<h2>Team</h2>\n");
    if team.is_empty() {
        section.push_str("<p class=\"empty\">No team members found.</p>\n");
        return section;
    }

    section.push_str("<ul>\n");
    for member in team {
        section.push_str(&format!("<li>{}</li>\n", escape_html(member)));
    }
    section.push_str("</ul>\n");

    section
}

fn generate_sprint_section(name: &str, sprint: &SprintDocument) -> String {
    let mut section = String::new();

    section.push_str(&format!("<h2>{}</h2>\n", escape_html(name)));
    section.push_str(&format!(
        "<p>Committed story points: <strong>{:.2}</strong></p>\n",
        sprint.committed_story_points
    ));

    section.push_str("<table>\n");
    section.push_str(
        "<tr><th>Team Member</th><th>Assigned Tasks</th><th>Completed Points</th><th>Completion</th></tr>\n",
    );
    for (assignee, delivered) in &sprint.delivered_story_points {
        let class = if delivered.percentage_of_completion >= 100.0 {
            " class=\"max\""
        } else {
            ""
        };
        section.push_str(&format!(
            "<tr{}><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.1}%</td></tr>\n",
            class,
            escape_html(assignee),
            delivered.list_of_assigned_tasks.len(),
            delivered.completed_story_points,
            delivered.percentage_of_completion
        ));
    }
    section.push_str("</table>\n");

    if !sprint.list_of_unique_tasks_titles.is_empty() {
        section.push_str("<details>\n<summary>Tasks</summary>\n<ul>\n");
        for title in &sprint.list_of_unique_tasks_titles {
            section.push_str(&format!("<li>{}</li>\n", escape_html(title)));
        }
        section.push_str("</ul>\n</details>\n");
    }

    if let Some(ref idle) = sprint.no_assigned_tasks_for {
        if !idle.is_empty() {
            let names: Vec<String> = idle.iter().map(|n| escape_html(n)).collect();
            section.push_str(&format!(
                "<p>No assigned tasks for: {}</p>\n",
                names.join(", ")
            ));
        }
    }

    section
}

fn generate_footer(generated_at: DateTime<Utc>) -> String {
    let mut footer = String::new();

    footer.push_str(&format!(
        "<footer>Rendered {}</footer>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    footer.push_str("</body>\n</html>\n");

    footer
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
