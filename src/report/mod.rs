//! Report documents and renderers.

pub mod document;
pub mod generator;

pub use document::{aggregates_document, ReportDocument};
pub use generator::{
    generate_csv_report, generate_html_report, generate_json_report, generate_placeholder_page,
};
