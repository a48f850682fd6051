//! Snapshot broadcast for task collection observers.

use crate::model::task::Task;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Receiving end of the task snapshot broadcast.
///
/// Receives the current snapshot on subscribe, then one snapshot per
/// mutation. Dropping it unsubscribes.
pub struct TaskSubscription {
    receiver: Receiver<Arc<[Task]>>,
}

impl TaskSubscription {
    /// Drains pending snapshots and returns the newest one, if any.
    pub fn latest(&self) -> Option<Arc<[Task]>> {
        self.receiver.try_iter().last()
    }

    /// Next pending snapshot without blocking.
    pub fn try_recv(&self) -> Option<Arc<[Task]>> {
        self.receiver.try_recv().ok()
    }

    /// Blocks for the next snapshot; `None` once the store is gone.
    pub fn recv(&self) -> Option<Arc<[Task]>> {
        self.receiver.recv().ok()
    }
}

#[derive(Default)]
pub(crate) struct SnapshotBroadcaster {
    subscribers: Vec<Sender<Arc<[Task]>>>,
}

impl SnapshotBroadcaster {
    pub(crate) fn subscribe(&mut self, current: Arc<[Task]>) -> TaskSubscription {
        let (sender, receiver) = mpsc::channel();
        // Receiver is alive here, the send cannot fail.
        let _ = sender.send(current);
        self.subscribers.push(sender);
        TaskSubscription { receiver }
    }

    /// Sends `snapshot` to every live subscriber and prunes dropped ones.
    pub(crate) fn publish(&mut self, snapshot: Arc<[Task]>) {
        self.subscribers
            .retain(|sender| sender.send(Arc::clone(&snapshot)).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
