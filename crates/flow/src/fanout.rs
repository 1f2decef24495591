//! FanOut - broadcast one readable to many writers

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{channel, Readable, Writer};
use tracing::{debug, instrument};

use crate::metrics::FanOutMetrics;

struct FanOutState<T> {
    /// Registered downstreams, in registration order
    writers: Vec<Writer<T>>,
    /// Upstream, taken by the pump on resume
    upstream: Option<Readable<T>>,
    /// Upstream has ended; new downstreams are closed immediately
    ended: bool,
}

/// Shared broadcast point.
///
/// Nothing flows until [`FanOut::resume`] spawns the pump. The pump awaits
/// every downstream in turn, so the slowest one sets the pace.
pub(crate) struct FanOut<T> {
    name: Arc<str>,
    state: Arc<Mutex<FanOutState<T>>>,
    metrics: Arc<FanOutMetrics>,
}

impl<T> Clone for FanOut<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T: Clone + Send + 'static> FanOut<T> {
    pub(crate) fn new(name: impl Into<Arc<str>>, upstream: Readable<T>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(FanOutState {
                writers: Vec::new(),
                upstream: Some(upstream),
                ended: false,
            })),
            metrics: Arc::new(FanOutMetrics::new()),
        }
    }

    pub(crate) fn metrics(&self) -> &Arc<FanOutMetrics> {
        &self.metrics
    }

    /// Register a downstream.
    ///
    /// Returns false if the upstream already ended; the writer is dropped,
    /// which ends its readable.
    pub(crate) fn add_writer(&self, writer: Writer<T>) -> bool {
        let mut state = lock(&self.state);
        if state.ended {
            return false;
        }
        state.writers.push(writer);
        self.metrics.set_taps(state.writers.len());
        true
    }

    /// Register a fresh downstream and return its readable
    pub(crate) fn tap(&self, capacity: usize) -> Readable<T> {
        let (tx, rx) = channel(capacity);
        self.add_writer(tx);
        rx
    }

    /// Whether the pump has been started
    pub(crate) fn is_flowing(&self) -> bool {
        lock(&self.state).upstream.is_none()
    }

    /// Start the pump. Returns true only for the call that started it.
    pub(crate) fn resume(&self) -> bool {
        let Some(upstream) = lock(&self.state).upstream.take() else {
            return false;
        };

        debug!(fanout = %self.name, "FanOut resumed");
        tokio::spawn(pump(
            Arc::clone(&self.name),
            upstream,
            Arc::clone(&self.state),
            Arc::clone(&self.metrics),
        ));
        true
    }
}

fn lock<T>(state: &Mutex<FanOutState<T>>) -> MutexGuard<'_, FanOutState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[instrument(name = "fanout_pump", skip(upstream, state, metrics), fields(fanout = %name))]
async fn pump<T: Clone + Send + 'static>(
    name: Arc<str>,
    mut upstream: Readable<T>,
    state: Arc<Mutex<FanOutState<T>>>,
    metrics: Arc<FanOutMetrics>,
) {
    debug!("FanOut pump started");

    while let Some(item) = upstream.recv().await {
        let writers = lock(&state).writers.clone();

        if writers.is_empty() {
            metrics.inc_dropped();
            observability::record_items_dropped(&name, 1);
            continue;
        }

        let mut any_closed = false;
        for writer in &writers {
            if writer.send_item(item.clone()).await.is_err() {
                any_closed = true;
            }
        }

        if any_closed {
            let mut guard = lock(&state);
            let before = guard.writers.len();
            guard.writers.retain(|w| !w.is_closed());
            metrics.add_closed_taps((before - guard.writers.len()) as u64);
            metrics.set_taps(guard.writers.len());
        }

        metrics.inc_forwarded();
        observability::record_items_forwarded(&name, 1);
    }

    // Dropping the writers ends every downstream readable
    let mut guard = lock(&state);
    guard.ended = true;
    guard.writers.clear();
    metrics.set_taps(0);

    debug!(
        forwarded = metrics.forwarded(),
        dropped = metrics.dropped(),
        "FanOut upstream ended"
    );
}
