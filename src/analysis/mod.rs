//! Sprint analysis pipeline.
//!
//! Raw records flow through the aggregator, the normalizer and the
//! assembler, in that order, to produce the final report.

pub mod aggregator;
pub mod assembler;
pub mod normalizer;

pub use aggregator::{aggregate_sprints, SprintAggregates};
pub use assembler::assemble_report;
