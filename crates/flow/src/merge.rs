//! SequentialMerge - group-ordered merge sink
//!
//! Every group is drained concurrently from the moment it is added, so a slow
//! early group never stalls the taps feeding a later one. Output is released
//! group by group: all of group k, then all of group k+1. Inside a group,
//! items interleave in arrival order.

use std::sync::Arc;

use contracts::{channel, Item, MergeSink, Readable, Writer};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::fanout::FanOut;

type GroupBuffer<T> = mpsc::UnboundedReceiver<Item<T>>;

/// Default merge sink
///
/// The combined output ends after the handle is dropped and every group
/// added so far has drained.
pub struct SequentialMerge<T> {
    name: Arc<str>,
    groups: mpsc::UnboundedSender<Vec<Readable<T>>>,
    output: FanOut<T>,
    groups_added: u64,
}

impl<T: Clone + Send + 'static> SequentialMerge<T> {
    /// Create a merge sink and spawn its workers.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let name = name.into();
        let (merged_tx, merged_rx) = channel(capacity);
        let (groups_tx, groups_rx) = mpsc::unbounded_channel();
        let (order_tx, order_rx) = mpsc::unbounded_channel();

        tokio::spawn(intake(Arc::clone(&name), groups_rx, order_tx));
        tokio::spawn(emit(Arc::clone(&name), order_rx, merged_tx));

        Self {
            output: FanOut::new(Arc::clone(&name), merged_rx),
            name,
            groups: groups_tx,
            groups_added: 0,
        }
    }

    /// Merge sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of groups added so far
    pub fn groups_added(&self) -> u64 {
        self.groups_added
    }
}

impl<T: Clone + Send + 'static> MergeSink<T> for SequentialMerge<T> {
    fn add(&mut self, group: Vec<Readable<T>>) {
        let size = group.len();
        if self.groups.send(group).is_err() {
            warn!(merge = %self.name, "Merge intake stopped, group discarded");
            return;
        }
        self.groups_added += 1;
        debug!(merge = %self.name, group = self.groups_added, size, "Group added");
    }

    fn pipe(&mut self, destination: Writer<T>) {
        if !self.output.add_writer(destination) {
            debug!(merge = %self.name, "Merged output already ended");
        }
        self.output.resume();
    }
}

/// Start draining each group as soon as it arrives and queue its buffer
#[instrument(name = "merge_intake", skip(groups, order), fields(merge = %name))]
async fn intake<T: Send + 'static>(
    name: Arc<str>,
    mut groups: mpsc::UnboundedReceiver<Vec<Readable<T>>>,
    order: mpsc::UnboundedSender<(u64, GroupBuffer<T>)>,
) {
    let mut index: u64 = 0;

    while let Some(group) = groups.recv().await {
        index += 1;
        let (buf_tx, buf_rx) = mpsc::unbounded_channel();

        for mut readable in group {
            let buf_tx = buf_tx.clone();
            tokio::spawn(async move {
                while let Some(item) = readable.recv().await {
                    if buf_tx.send(item).is_err() {
                        break;
                    }
                }
            });
        }
        drop(buf_tx);

        if order.send((index, buf_rx)).is_err() {
            break;
        }
    }

    debug!(groups = index, "Merge intake closed");
}

/// Release buffered groups in order into the combined output
#[instrument(name = "merge_emit", skip(order, merged), fields(merge = %name))]
async fn emit<T: Send + 'static>(
    name: Arc<str>,
    mut order: mpsc::UnboundedReceiver<(u64, GroupBuffer<T>)>,
    merged: Writer<T>,
) {
    while let Some((index, mut buffer)) = order.recv().await {
        let mut items: u64 = 0;
        while let Some(item) = buffer.recv().await {
            if merged.send_item(item).await.is_err() {
                debug!(group = index, "Merged output dropped");
                return;
            }
            items += 1;
        }
        debug!(group = index, items, "Group drained");
    }

    debug!("Merge emit finished");
}
