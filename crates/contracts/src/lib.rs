//! # Contracts
//!
//! Frozen interface contracts shared by every forkline crate.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data-flow model
//! - Streams are bounded tokio channels carrying [`Item`]s
//! - Errors travel in-band as `Err(FlowError)` items, never out of band
//! - A [`Stage`] turns one readable into another, a [`MergeSink`] combines many

mod blueprint;
mod channel;
mod config;
mod error;
mod merge;
mod stage;

pub use blueprint::*;
pub use channel::{channel, Item, Readable, Writer};
pub use config::*;
pub use error::*;
pub use merge::MergeSink;
pub use stage::Stage;
