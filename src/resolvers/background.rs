//! Background write-back queue.
//!
//! Cache writes that must not hold up the caller are submitted here. A single
//! worker runs them in order; failures are logged at the task boundary and
//! never reach the code that submitted them.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::cache::Payload;
use crate::database::{Store, StoreError};

type Job = BoxFuture<'static, Result<(), StoreError>>;

enum Message {
    Write { label: String, job: Job },
    Drain(oneshot::Sender<()>),
}

/// Handle to the write-back worker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WriteBackQueue {
    tx: mpsc::UnboundedSender<Message>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { label, .. } => f.debug_struct("Write").field("label", label).finish(),
            Self::Drain(_) => f.write_str("Drain"),
        }
    }
}

impl WriteBackQueue {
    /// Start the worker on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx));
        Self { tx }
    }

    /// Queue a write. Returns immediately.
    pub fn submit<F>(&self, label: impl Into<String>, job: F)
    where
        F: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        let label = label.into();
        let message = Message::Write {
            label: label.clone(),
            job: Box::pin(job),
        };
        if self.tx.send(message).is_err() {
            warn!("Write-back worker is gone, dropping '{}'", label);
        }
    }

    /// Queue an upsert of `value` under `key` in `store`.
    pub fn put<V: Payload>(&self, store: Arc<dyn Store<V>>, key: impl Into<String>, value: V) {
        let key = key.into();
        let label = format!("{} <- {}", store.name(), key);
        self.submit(label, async move { store.put(&key, &value).await });
    }

    /// Wait until every write submitted before this call has finished.
    pub async fn drain(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Message::Drain(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Write { label, job } => match tokio::spawn(job).await {
                Ok(Ok(())) => debug!("Write-back '{}' done", label),
                Ok(Err(e)) => warn!("Write-back '{}' failed: {}", label, e),
                Err(e) => error!("Write-back '{}' panicked: {}", label, e),
            },
            Message::Drain(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Write-back worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn drain_waits_for_queued_writes() {
        let store = Arc::new(MemoryStore::<String>::new("local", Arc::new(ManualClock::default())));
        let target: Arc<dyn Store<String>> = store.clone();
        let queue = WriteBackQueue::spawn();

        queue.put(target.clone(), "pho-bo", "broth".to_string());
        queue.put(target, "bun-cha", "pork".to_string());
        queue.drain().await;

        assert_eq!(store.calls().puts, 2);
        assert_eq!(store.peek("pho-bo").unwrap().value, "broth");
    }

    #[tokio::test]
    async fn failed_write_does_not_stop_the_worker() {
        let store = Arc::new(MemoryStore::<String>::new("local", Arc::new(ManualClock::default())));
        let target: Arc<dyn Store<String>> = store.clone();
        let queue = WriteBackQueue::spawn();

        store.set_unreachable(true);
        queue.put(target.clone(), "pho-bo", "lost".to_string());
        queue.drain().await;

        store.set_unreachable(false);
        queue.put(target, "pho-bo", "kept".to_string());
        queue.drain().await;

        assert_eq!(store.peek("pho-bo").unwrap().value, "kept");
    }
}
