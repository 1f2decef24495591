//! Line pipeline: blueprint → fork → merged output.

mod branches;
mod runner;
mod stats;

pub use runner::LinePipeline;
pub use stats::PipelineStats;
