//! TransformStage - closure-driven processing stage

use contracts::{channel, FlowError, Readable, Stage, Writer, DEFAULT_CHANNEL_CAPACITY};
use tracing::{debug, error, instrument};

type TransformFn<I, O> = Box<dyn FnMut(I) -> Result<Option<O>, FlowError> + Send>;

/// Stage that runs a closure over every item on its own task.
///
/// - `Ok(Some(v))` emits `v`, `Ok(None)` skips the item
/// - `Err(e)` is emitted in-band and ends the stage
/// - Upstream errors are forwarded unchanged and the stage keeps running
pub struct TransformStage<I, O> {
    name: String,
    capacity: usize,
    f: TransformFn<I, O>,
}

impl<I: Send + 'static, O: Send + 'static> TransformStage<I, O> {
    /// Create a stage from a fallible filter-map closure
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(I) -> Result<Option<O>, FlowError> + Send + 'static,
    {
        Self {
            name: name.into(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            f: Box::new(f),
        }
    }

    /// Infallible one-to-one stage
    pub fn map<F>(name: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut(I) -> O + Send + 'static,
    {
        Self::new(name, move |item| Ok(Some(f(item))))
    }

    /// Fallible one-to-one stage
    pub fn try_map<F>(name: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut(I) -> Result<O, FlowError> + Send + 'static,
    {
        Self::new(name, move |item| f(item).map(Some))
    }

    /// Output channel capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

impl<T: Send + 'static> TransformStage<T, T> {
    /// Keep items matching `predicate`
    pub fn filter<P>(name: impl Into<String>, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        Self::new(name, move |item| Ok(predicate(&item).then_some(item)))
    }
}

impl<I: Send + 'static, O: Send + 'static> Stage<I, O> for TransformStage<I, O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(self: Box<Self>, input: Readable<I>) -> Readable<O> {
        let (tx, rx) = channel(self.capacity);
        let TransformStage { name, f, .. } = *self;
        tokio::spawn(stage_worker(name, input, tx, f));
        rx
    }
}

/// Worker task that drives one stage
#[instrument(name = "stage_worker_loop", skip(input, output, f), fields(stage = %name))]
async fn stage_worker<I, O>(
    name: String,
    mut input: Readable<I>,
    output: Writer<O>,
    mut f: TransformFn<I, O>,
) {
    debug!("Stage worker started");
    let mut processed: u64 = 0;

    while let Some(item) = input.recv().await {
        let result = match item {
            Ok(value) => f(value),
            Err(upstream) => {
                if output.fail(upstream).await.is_err() {
                    break;
                }
                continue;
            }
        };

        match result {
            Ok(Some(value)) => {
                if output.send(value).await.is_err() {
                    debug!("Stage output dropped");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Stage failed");
                let _ = output.fail(e).await;
                break;
            }
        }
        processed += 1;
    }

    debug!(processed, "Stage worker stopped");
}
