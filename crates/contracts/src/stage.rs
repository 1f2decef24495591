//! Stage trait - processing unit a source can be piped into

use crate::Readable;

/// A processing stage.
///
/// Connecting consumes the stage: it takes ownership of its input and hands
/// back the readable it produces. Implementations usually spawn a task.
pub trait Stage<I, O>: Send {
    /// Stage name (used for logging)
    fn name(&self) -> &str;

    /// Wire `input` through the stage and return its output
    fn connect(self: Box<Self>, input: Readable<I>) -> Readable<O>;
}
