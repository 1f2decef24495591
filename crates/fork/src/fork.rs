//! Fork - fan one source out to many participants and merge them back
//!
//! State machine: no source → attached → processing. Processing only runs
//! while a live source AND a merge sink are both present; otherwise every
//! trigger is a no-op and participants keep accumulating.

use std::collections::VecDeque;
use std::mem;

use contracts::{channel, ForkConfig, MergeSink, Readable, Writer};
use flow::{Attach, SequentialMerge, Source, SourceId, WeakSource};
use tracing::{debug, info, instrument, warn};

use crate::participant::Participant;

type MergeFactory<M> = Box<dyn FnOnce() -> M + Send>;
type Batch<I, O> = Vec<Participant<I, O>>;

/// Counters describing what a fork has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForkStats {
    /// Participants started against a source
    pub participants_started: u64,
    /// Non-empty batches added to the merge sink
    pub batches_flushed: u64,
    /// Empty batches dropped during processing
    pub empty_batches_skipped: u64,
    /// Attach notifications ignored because a source was active
    pub attaches_ignored: u64,
    /// Detach notifications for a source that was not the active one
    pub detaches_ignored: u64,
}

/// Fork/join combinator.
///
/// ```ignore
/// let mut fork = Fork::new();
/// fork.add(Participant::stage(TransformStage::map("upper", |s: String| s.to_uppercase())))
///     .join()
///     .add(Participant::stage(TransformStage::map("len", |s: String| s.len().to_string())));
/// source.pipe(&mut fork);
/// let merged = fork.finish();
/// ```
///
/// The fork keeps only a weak reference to its source; the caller keeps the
/// source alive until the participants have been started.
pub struct Fork<I, O, M = SequentialMerge<O>> {
    config: ForkConfig,
    /// Active source (first attacher wins)
    source: Option<WeakSource<I>>,
    /// Open batch
    participants: Batch<I, O>,
    /// Closed batches, oldest first
    joins: VecDeque<Batch<I, O>>,
    merge: Option<M>,
    merge_factory: Option<MergeFactory<M>>,
    stats: ForkStats,
}

impl<I, O> Fork<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    /// Create a fork with the default configuration
    pub fn new() -> Self {
        Self::with_config(ForkConfig::default())
    }

    /// Create a fork backed by a [`SequentialMerge`]
    pub fn with_config(config: ForkConfig) -> Self {
        let name = config.name.clone();
        let capacity = config.merge_capacity;
        Self::with_merge(config, move || SequentialMerge::new(name, capacity))
    }
}

impl<I, O> Default for Fork<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O, M> Fork<I, O, M>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
    M: MergeSink<O>,
{
    /// Create a fork with a custom merge sink.
    ///
    /// `factory` runs at most once, on the first [`Fork::pipe`].
    pub fn with_merge<F>(config: ForkConfig, factory: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self {
            config,
            source: None,
            participants: Vec::new(),
            joins: VecDeque::new(),
            merge: None,
            merge_factory: Some(Box::new(factory)),
            stats: ForkStats::default(),
        }
    }

    /// Fork name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Fork configuration
    pub fn config(&self) -> &ForkConfig {
        &self.config
    }

    /// Append a participant to the open batch
    #[instrument(
        name = "fork_add",
        skip(self, participant),
        fields(fork = %self.config.name, kind = participant.kind())
    )]
    pub fn add(&mut self, participant: Participant<I, O>) -> &mut Self {
        self.participants.push(participant);
        self.process();
        self
    }

    /// Append several participants to the open batch
    pub fn add_all<T>(&mut self, participants: T) -> &mut Self
    where
        T: IntoIterator<Item = Participant<I, O>>,
    {
        self.participants.extend(participants);
        self.process();
        self
    }

    /// Close the open batch (even if empty) behind a join barrier.
    ///
    /// Participants added afterwards reach the merge sink only after every
    /// earlier batch has been added to it.
    #[instrument(name = "fork_join", skip(self), fields(fork = %self.config.name))]
    pub fn join(&mut self) -> &mut Self {
        let batch = mem::take(&mut self.participants);
        let had_participants = !batch.is_empty();
        self.joins.push_back(batch);
        debug!(queued = self.joins.len(), "Join barrier");

        if had_participants {
            self.process();
        }
        self
    }

    /// Join, create the merge sink if needed, and connect its output to
    /// `destination`.
    ///
    /// Repeated calls reuse the same merge sink.
    #[instrument(name = "fork_pipe", skip(self, destination), fields(fork = %self.config.name))]
    pub fn pipe(&mut self, destination: Writer<O>) -> &mut Self {
        if self.merge.is_none() {
            if let Some(factory) = self.merge_factory.take() {
                info!("Creating merge sink");
                self.merge = Some(factory());
            }
        }
        if let Some(merge) = self.merge.as_mut() {
            merge.pipe(destination);
        }

        self.join();
        // join() only processes a non-empty open batch; batches queued
        // before the merge sink existed still need flushing.
        self.process();
        self
    }

    /// Pipe into a fresh channel and return its readable
    pub fn output(&mut self) -> Readable<O> {
        let (tx, rx) = channel(self.config.channel_capacity);
        self.pipe(tx);
        rx
    }

    /// Pipe into a fresh channel and close the fork.
    ///
    /// The returned readable ends once every started participant has ended.
    pub fn finish(mut self) -> Readable<O> {
        let output = self.output();
        self.close();
        output
    }

    /// Close the fork and return its final stats.
    ///
    /// Releases the merge sink so its output can end. Participants that were
    /// never started are dropped.
    pub fn close(self) -> ForkStats {
        let pending = self.pending_participants();
        if pending > 0 {
            warn!(fork = %self.config.name, pending, "Closing fork with unstarted participants");
        }
        debug!(fork = %self.config.name, stats = ?self.stats, "Fork closed");
        self.stats
    }

    /// Identifier of the active source
    pub fn source_id(&self) -> Option<SourceId> {
        self.source.as_ref().map(WeakSource::id)
    }

    /// Batches waiting to be processed (the open batch counts if non-empty)
    pub fn pending_batches(&self) -> usize {
        self.joins.len() + usize::from(!self.participants.is_empty())
    }

    /// Participants not started yet
    pub fn pending_participants(&self) -> usize {
        self.participants.len() + self.joins.iter().map(Vec::len).sum::<usize>()
    }

    /// Whether the merge sink has been created
    pub fn has_merge(&self) -> bool {
        self.merge.is_some()
    }

    /// The merge sink, once created
    pub fn merge(&self) -> Option<&M> {
        self.merge.as_ref()
    }

    /// Activity counters
    pub fn stats(&self) -> ForkStats {
        self.stats
    }

    /// Flush every pending batch into the merge sink, oldest first.
    ///
    /// No-op unless a live source and the merge sink are both present.
    fn process(&mut self) {
        let Some(weak) = self.source.as_ref() else {
            return;
        };
        let Some(source) = weak.upgrade() else {
            debug!(fork = %self.config.name, source = %weak.id(), "Source dropped, detaching");
            self.source = None;
            return;
        };
        let Some(merge) = self.merge.as_mut() else {
            return;
        };

        // The open batch is always younger than every queued one
        if !self.participants.is_empty() {
            self.joins.push_back(mem::take(&mut self.participants));
        }

        let mut started: u64 = 0;
        while let Some(batch) = self.joins.pop_front() {
            if batch.is_empty() {
                self.stats.empty_batches_skipped += 1;
                continue;
            }

            let size = batch.len();
            let outputs: Vec<Readable<O>> = batch
                .into_iter()
                .map(|participant| {
                    observability::record_participant_started(&self.config.name, participant.kind());
                    participant.start(&source)
                })
                .collect();
            merge.add(outputs);

            started += size as u64;
            self.stats.batches_flushed += 1;
            observability::record_batch_flushed(&self.config.name, size);
            debug!(
                fork = %self.config.name,
                source = %source.id(),
                size,
                "Batch flushed to merge sink"
            );
        }

        if started > 0 {
            self.stats.participants_started += started;
            source.resume();
        }
    }
}

impl<I, O, M> Attach<I> for Fork<I, O, M>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
    M: MergeSink<O>,
{
    fn on_attach(&mut self, source: &Source<I>) {
        let active = self
            .source
            .as_ref()
            .is_some_and(|weak| weak.upgrade().is_some());

        if active {
            // First attacher wins until it detaches
            self.stats.attaches_ignored += 1;
            observability::record_attach(&self.config.name, false);
            debug!(
                fork = %self.config.name,
                source = %source.id(),
                active = ?self.source_id(),
                "Source already attached, ignoring"
            );
            return;
        }

        info!(fork = %self.config.name, source = %source.id(), name = source.name(), "Source attached");
        observability::record_attach(&self.config.name, true);
        self.source = Some(source.downgrade());

        if self.pending_batches() > 0 {
            self.process();
        }
    }

    fn on_detach(&mut self, source: &Source<I>) {
        let matched = self.source.as_ref().is_some_and(|weak| weak.is(source));
        observability::record_detach(&self.config.name, matched);

        if matched {
            info!(fork = %self.config.name, source = %source.id(), "Source detached");
            self.source = None;
        } else {
            self.stats.detaches_ignored += 1;
            debug!(fork = %self.config.name, source = %source.id(), "Stale detach ignored");
        }
    }
}
