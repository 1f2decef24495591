//! # Fork
//!
//! Fork/join combinator over a single source.
//!
//! Responsibilities:
//! - Observe the source piped into the fork (first attacher wins)
//! - Start every participant exactly once against that source
//! - Stage participants into join batches and hand them to the merge sink in order
//! - Create the merge sink lazily, on the first `pipe`

pub mod fork;
pub mod participant;

pub use contracts::{ForkConfig, MergeSink, Readable, Stage, Writer};
pub use flow::{Attach, SequentialMerge, Source, SourceId};
pub use fork::{Fork, ForkStats};
pub use participant::{ForkCallback, Participant};
