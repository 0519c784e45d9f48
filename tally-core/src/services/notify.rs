//! Change notification
//!
//! Observers are told *that* the ledger changed, not what changed; they
//! re-read whatever they render. Callbacks run synchronously after the
//! change has been persisted. Channel subscribers receive the ledger
//! revision and are dropped once their receiver goes away.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Default)]
pub struct ChangeNotifier {
    callbacks: Vec<Box<dyn Fn()>>,
    channels: Vec<Sender<u64>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired after every successful mutation
    pub fn subscribe(&mut self, callback: impl Fn() + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Register a channel receiving the revision after every mutation
    pub fn subscribe_channel(&mut self) -> Receiver<u64> {
        let (tx, rx) = mpsc::channel();
        self.channels.push(tx);
        rx
    }

    pub fn observer_count(&self) -> usize {
        self.callbacks.len() + self.channels.len()
    }

    pub fn notify(&mut self, revision: u64) {
        for callback in &self.callbacks {
            callback();
        }
        self.channels.retain(|tx| tx.send(revision).is_ok());
    }
}
