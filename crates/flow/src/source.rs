//! Source - shareable upstream handle
//!
//! A `Source` wraps one upstream readable and hands out any number of taps.
//! Every tap sees every item that arrives after it was registered.
//!
//! # Example
//!
//! ```ignore
//! let (tx, source) = Source::channel("lines", 16);
//! let left = source.tap();
//! let right = source.tap();
//! source.resume();
//! tx.send("hello".to_string()).await?;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use contracts::{channel, Readable, Writer, DEFAULT_CHANNEL_CAPACITY};
use tracing::debug;

use crate::fanout::FanOut;
use crate::metrics::FanOutSnapshot;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src-{}", self.0)
    }
}

/// Receiver of attach/detach notifications.
///
/// Driven by [`Source::pipe`] and [`Source::unpipe`].
pub trait Attach<T> {
    /// A source was piped into this receiver
    fn on_attach(&mut self, source: &Source<T>);

    /// A source was unpiped from this receiver
    fn on_detach(&mut self, source: &Source<T>);
}

struct SourceInner<T> {
    id: SourceId,
    name: String,
    tap_capacity: usize,
    fanout: FanOut<T>,
}

/// Shareable handle to one upstream
pub struct Source<T> {
    inner: Arc<SourceInner<T>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

impl<T> Source<T> {
    /// Source identifier
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Source name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakSource<T> {
        WeakSource {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same source
    pub fn ptr_eq(&self, other: &Source<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Notify `destination` that this source is piped into it
    pub fn pipe<A: Attach<T>>(&self, destination: &mut A) {
        debug!(source = %self.inner.id, name = %self.inner.name, "Source piped");
        destination.on_attach(self);
    }

    /// Notify `destination` that this source is unpiped from it
    pub fn unpipe<A: Attach<T>>(&self, destination: &mut A) {
        debug!(source = %self.inner.id, name = %self.inner.name, "Source unpiped");
        destination.on_detach(self);
    }
}

impl<T: Clone + Send + 'static> Source<T> {
    /// Wrap an upstream readable
    pub fn new(name: impl Into<String>, upstream: Readable<T>) -> Self {
        Self::with_tap_capacity(name, upstream, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Wrap an upstream readable with a custom tap capacity
    pub fn with_tap_capacity(
        name: impl Into<String>,
        upstream: Readable<T>,
        tap_capacity: usize,
    ) -> Self {
        let name = name.into();
        let id = SourceId::next();
        let fanout = FanOut::new(format!("{name}#{}", id.0), upstream);
        Self {
            inner: Arc::new(SourceInner {
                id,
                name,
                tap_capacity: tap_capacity.max(1),
                fanout,
            }),
        }
    }

    /// Create a source fed by the returned writer
    pub fn channel(name: impl Into<String>, capacity: usize) -> (Writer<T>, Self) {
        let (tx, rx) = channel(capacity);
        (tx, Self::with_tap_capacity(name, rx, capacity))
    }

    /// Create a source that yields `items` and then ends.
    ///
    /// Spawns the producer; must be called within a tokio runtime.
    pub fn from_iter<I>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let (tx, source) = Self::channel(name, DEFAULT_CHANNEL_CAPACITY);
        let items = items.into_iter();
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        source
    }

    /// Register a new downstream
    pub fn tap(&self) -> Readable<T> {
        self.inner.fanout.tap(self.inner.tap_capacity)
    }

    /// Start forwarding upstream items to the taps.
    ///
    /// Returns true only for the call that started the flow.
    pub fn resume(&self) -> bool {
        self.inner.fanout.resume()
    }

    /// Whether the source has been resumed
    pub fn is_flowing(&self) -> bool {
        self.inner.fanout.is_flowing()
    }

    /// Current fan-out metrics
    pub fn metrics(&self) -> FanOutSnapshot {
        self.inner.fanout.metrics().snapshot()
    }
}

/// Non-owning source handle
pub struct WeakSource<T> {
    id: SourceId,
    inner: Weak<SourceInner<T>>,
}

impl<T> Clone for WeakSource<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSource").field("id", &self.id).finish()
    }
}

impl<T> WeakSource<T> {
    /// Identifier of the referenced source
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Upgrade to a strong handle if the source is still alive
    pub fn upgrade(&self) -> Option<Source<T>> {
        self.inner.upgrade().map(|inner| Source { inner })
    }

    /// Whether this handle refers to `source`
    pub fn is(&self, source: &Source<T>) -> bool {
        Weak::ptr_eq(&self.inner, &Arc::downgrade(&source.inner))
    }
}
