//! MergeSink trait - N-input combiner

use crate::{Readable, Writer};

/// Combines groups of readables into one output.
///
/// Groups must become visible in the order they were added: a group added
/// later is never emitted ahead of one added earlier. Within a group, items
/// may interleave freely.
pub trait MergeSink<T>: Send {
    /// Add a group of readables that enter the combined output together
    fn add(&mut self, group: Vec<Readable<T>>);

    /// Connect the combined output to `destination`.
    ///
    /// May be called repeatedly; each destination sees output produced after
    /// it was connected.
    fn pipe(&mut self, destination: Writer<T>);
}
