//! # Flow
//!
//! Data-flow collaborators for the fork orchestrator.
//!
//! Provides:
//! - `Source`: one upstream broadcast to many taps
//! - `Attach`: attach/detach notification contract
//! - `TransformStage`: closure-driven stages
//! - `SequentialMerge`: group-ordered merge sink

mod fanout;
pub mod merge;
pub mod metrics;
pub mod source;
pub mod stage;

pub use contracts::{channel, FlowError, Item, MergeSink, Readable, Stage, Writer};
pub use merge::SequentialMerge;
pub use metrics::{FanOutMetrics, FanOutSnapshot};
pub use source::{Attach, Source, SourceId, WeakSource};
pub use stage::TransformStage;
