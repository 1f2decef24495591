//! Participant - one branch of a fork

use std::fmt;

use contracts::{Readable, Stage};
use flow::{Source, TransformStage};

/// Callback participant: builds its output from the source
pub type ForkCallback<I, O> = Box<dyn FnOnce(&Source<I>) -> Readable<O> + Send>;

/// A unit of per-branch processing.
///
/// The shape is fixed at construction; the fork never inspects what a
/// participant does with the source.
pub enum Participant<I, O> {
    /// Invoked once with the source; returns the branch output
    Callback(ForkCallback<I, O>),
    /// The source is tapped into the stage
    Stage(Box<dyn Stage<I, O>>),
}

impl<I, O> Participant<I, O> {
    /// Wrap a callback
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(&Source<I>) -> Readable<O> + Send + 'static,
    {
        Self::Callback(Box::new(f))
    }

    /// Wrap a stage
    pub fn stage<S>(stage: S) -> Self
    where
        S: Stage<I, O> + 'static,
    {
        Self::Stage(Box::new(stage))
    }

    /// Shape label (used for logging/metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Callback(_) => "callback",
            Self::Stage(_) => "stage",
        }
    }
}

impl<I: Clone + Send + 'static, O> Participant<I, O> {
    /// Start the participant against `source`, consuming it
    pub(crate) fn start(self, source: &Source<I>) -> Readable<O> {
        match self {
            Self::Callback(f) => f(source),
            Self::Stage(stage) => stage.connect(source.tap()),
        }
    }
}

impl<I: Send + 'static, O: Send + 'static> From<TransformStage<I, O>> for Participant<I, O> {
    fn from(stage: TransformStage<I, O>) -> Self {
        Self::Stage(Box::new(stage))
    }
}

impl<I, O> fmt::Debug for Participant<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Participant::Callback"),
            Self::Stage(stage) => write!(f, "Participant::Stage({})", stage.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_kind_and_debug() {
        let cb: Participant<u32, u32> = Participant::callback(|src: &Source<u32>| src.tap());
        assert_eq!(cb.kind(), "callback");

        let stage: Participant<u32, u32> = TransformStage::map("inc", |x: u32| x + 1).into();
        assert_eq!(stage.kind(), "stage");
        assert_eq!(format!("{stage:?}"), "Participant::Stage(inc)");
    }

    #[tokio::test]
    async fn test_stage_participant_reads_source() {
        let source = Source::from_iter("nums", vec![1u32, 2, 3]);
        let participant: Participant<u32, u32> =
            Participant::stage(TransformStage::map("square", |x: u32| x * x));

        let out = participant.start(&source);
        source.resume();
        assert_eq!(out.collect().await.unwrap(), vec![1, 4, 9]);
    }

    #[tokio::test]
    async fn test_callback_receives_source() {
        let source = Source::from_iter("nums", vec![5u32]);
        let expected = source.id();
        let participant = Participant::callback(move |src: &Source<u32>| {
            assert_eq!(src.id(), expected);
            src.tap()
        });

        let out = participant.start(&source);
        source.resume();
        assert_eq!(out.collect().await.unwrap(), vec![5]);
    }
}
