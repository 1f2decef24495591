//! Readable / Writer - bounded data-flow channel
//!
//! The only stream primitive the workspace uses. Backpressure comes from the
//! bounded tokio channel: a `send` waits while the readable side is full.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::FlowError;

/// One element on a readable: data or an in-band error
pub type Item<T> = Result<T, FlowError>;

/// Create a bounded channel pair.
///
/// `capacity` is clamped to at least 1.
pub fn channel<T>(capacity: usize) -> (Writer<T>, Readable<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Writer { tx }, Readable { rx })
}

/// Sending half of a channel
///
/// The paired [`Readable`] ends once every clone of the writer is dropped.
#[derive(Debug)]
pub struct Writer<T> {
    tx: mpsc::Sender<Item<T>>,
}

impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Writer<T> {
    /// Send a data item, waiting for capacity
    pub async fn send(&self, value: T) -> Result<(), FlowError> {
        self.send_item(Ok(value)).await
    }

    /// Send an item (data or error), waiting for capacity
    pub async fn send_item(&self, item: Item<T>) -> Result<(), FlowError> {
        self.tx
            .send(item)
            .await
            .map_err(|_| FlowError::closed("readable dropped"))
    }

    /// Signal an error downstream
    pub async fn fail(&self, error: FlowError) -> Result<(), FlowError> {
        self.send_item(Err(error)).await
    }

    /// Whether the readable side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a channel
#[derive(Debug)]
pub struct Readable<T> {
    rx: mpsc::Receiver<Item<T>>,
}

impl<T> Readable<T> {
    /// Receive the next item; `None` once every writer is gone
    pub async fn recv(&mut self) -> Option<Item<T>> {
        self.rx.recv().await
    }

    /// Collect every data item until the end of stream.
    ///
    /// # Errors
    /// Returns the first in-band error encountered.
    pub async fn collect(mut self) -> Result<Vec<T>, FlowError> {
        let mut out = Vec::new();
        while let Some(item) = self.rx.recv().await {
            out.push(item?);
        }
        Ok(out)
    }

    /// Collect every item, errors included
    pub async fn drain(mut self) -> Vec<Item<T>> {
        let mut out = Vec::new();
        while let Some(item) = self.rx.recv().await {
            out.push(item);
        }
        out
    }
}

impl<T: Send + 'static> Readable<T> {
    /// Forward every item into `destination` on a background task.
    ///
    /// The task resolves to the number of forwarded items and stops early if
    /// the destination is dropped.
    pub fn pipe(mut self, destination: Writer<T>) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut forwarded = 0u64;
            while let Some(item) = self.rx.recv().await {
                if destination.send_item(item).await.is_err() {
                    break;
                }
                forwarded += 1;
            }
            forwarded
        })
    }
}
