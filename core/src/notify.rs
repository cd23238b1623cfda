// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change notifications delivered on a background worker thread
//!
//! Mutations queue events only after they have fully committed. The listeners
//! an event goes to are fixed when it is queued: a listener registered later
//! never sees it. A single worker drains the queue and calls listeners, so
//! listeners of one hook run in registration order and never on the mutating
//! thread. A panicking listener is logged and skipped.

use crate::tree::NodeId;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Kinds of notification a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    NodeAdded,
    NodeRemoved,
    CurrentNodeChanged,
    NodeDataUpdated,
    /// Data of the node under the cursor changed
    CurrentNodeDataUpdated,
}

/// A committed change to the game model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    NodeAdded {
        node: NodeId,
        parent: NodeId,
    },
    NodeRemoved {
        node: NodeId,
        parent: NodeId,
    },
    CurrentNodeChanged {
        previous: NodeId,
        current: NodeId,
    },
    NodeDataUpdated {
        node: NodeId,
    },
    CurrentNodeDataUpdated {
        node: NodeId,
    },
}

impl ModelEvent {
    pub fn hook(&self) -> Hook {
        match self {
            ModelEvent::NodeAdded { .. } => Hook::NodeAdded,
            ModelEvent::NodeRemoved { .. } => Hook::NodeRemoved,
            ModelEvent::CurrentNodeChanged { .. } => Hook::CurrentNodeChanged,
            ModelEvent::NodeDataUpdated { .. } => Hook::NodeDataUpdated,
            ModelEvent::CurrentNodeDataUpdated { .. } => Hook::CurrentNodeDataUpdated,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ModelEvent) + Send + Sync>;
type ListenerMap = HashMap<Hook, Vec<(ListenerId, Listener)>>;

enum Message {
    Event(ModelEvent, Vec<Listener>),
    /// Acknowledged once everything queued before it has been delivered
    Flush(Sender<()>),
}

/// Owns the listener registry and the delivery worker
pub struct Notifier {
    tx: Option<Sender<Message>>,
    listeners: RwLock<ListenerMap>,
    next_id: AtomicU64,
    worker: Option<thread::JoinHandle<()>>,
}

impl Notifier {
    /// Start the delivery worker
    pub fn new() -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        let listeners = RwLock::new(HashMap::new());

        let worker = thread::Builder::new()
            .name("kifu-notify".to_string())
            .spawn(move || run_worker(rx))?;

        Ok(Self {
            tx: Some(tx),
            listeners,
            next_id: AtomicU64::new(0),
            worker: Some(worker),
        })
    }

    /// Register a listener for one hook
    pub fn subscribe<F>(&self, hook: Hook, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(hook)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let mut found = false;
        for entries in listeners.values_mut() {
            let before = entries.len();
            entries.retain(|(entry, _)| *entry != id);
            found |= entries.len() != before;
        }
        found
    }

    /// Queue an event for the listeners registered right now
    pub fn emit(&self, event: ModelEvent) {
        if let Some(tx) = &self.tx {
            let targets: Vec<Listener> = self
                .listeners
                .read()
                .get(&event.hook())
                .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default();
            if targets.is_empty() {
                return;
            }
            if tx.send(Message::Event(event, targets)).is_err() {
                tracing::warn!("notification worker is gone, dropping event");
            }
        }
    }

    /// Block until every event queued so far has been delivered
    pub fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish what is queued and exit
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("notification worker panicked");
            }
        }
        self.listeners.write().clear();
    }
}

fn run_worker(rx: Receiver<Message>) {
    for message in rx {
        match message {
            Message::Event(event, targets) => {
                for listener in targets {
                    let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener(&event)));
                    if delivered.is_err() {
                        tracing::error!(hook = ?event.hook(), "listener panicked");
                    }
                }
            }
            Message::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::trace!("notification worker stopped");
}
