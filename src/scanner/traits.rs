//! Task and executor abstractions.
//!
//! The worker pool only knows how to run a [`Task`] through an [`Executor`];
//! what a probe actually does lives behind the trait, so the scheduling
//! machinery can be tested with a recording executor.

use crate::types::ProbeDescriptor;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Runs one probe to completion. Implementations report their own results.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, descriptor: ProbeDescriptor);
}

/// Held by every task of a batch; the batch is complete once all tokens drop.
#[derive(Debug, Clone)]
pub struct CompletionToken {
    _tx: mpsc::Sender<()>,
}

/// Waits for every task of one enumeration batch.
#[derive(Debug)]
pub struct BatchGroup {
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
}

impl BatchGroup {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }

    /// A token to attach to one task of this batch.
    pub fn token(&self) -> CompletionToken {
        CompletionToken {
            _tx: self.tx.clone(),
        }
    }

    /// Resolve once every token handed out has been dropped.
    pub async fn wait(self) {
        let Self { tx, mut rx } = self;
        drop(tx);
        while rx.recv().await.is_some() {}
    }
}

impl Default for BatchGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit of work for the pool.
#[derive(Debug)]
pub struct Task {
    pub descriptor: ProbeDescriptor,
    completion: Option<CompletionToken>,
}

impl Task {
    pub fn new(descriptor: ProbeDescriptor) -> Self {
        Self {
            descriptor,
            completion: None,
        }
    }

    /// Tie this task to a batch; the batch waits until it has executed.
    pub fn with_completion(mut self, token: CompletionToken) -> Self {
        self.completion = Some(token);
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.completion.is_some()
    }
}
