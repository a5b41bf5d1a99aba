use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Holds the current key snapshot for many readers and one writer
///
/// Snapshots are immutable. [`replace`](Self::replace) swaps the whole
/// `Arc`, so a reader holding a snapshot keeps seeing it unchanged while
/// later readers see the new one.
pub struct KeyCache<T> {
    current: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for KeyCache<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<T> KeyCache<T> {
    /// Create a cache seeded with its first snapshot
    pub fn new(initial: T) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// The current snapshot
    pub async fn current(&self) -> Arc<T> {
        Arc::clone(&*self.current.read().await)
    }

    /// Install a new snapshot and return the one it replaced
    pub async fn replace(&self, snapshot: T) -> Arc<T> {
        let snapshot = Arc::new(snapshot);
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, snapshot)
    }
}

/// Drain refreshed descriptions into the cache until the channel closes
///
/// Each description is decoded before installation; one that fails to decode
/// is logged and dropped, leaving the previous snapshot current.
pub(crate) fn spawn_installer<R, T, F>(
    cache: KeyCache<T>,
    mut updates: mpsc::Receiver<R>,
    decode: F,
) -> JoinHandle<()>
where
    R: Send + 'static,
    T: Display + Send + Sync + 'static,
    F: Fn(R) -> Result<T> + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(raw) = updates.recv().await {
            match decode(raw) {
                Ok(snapshot) => {
                    let installed = snapshot.to_string();
                    let previous = cache.replace(snapshot).await;
                    tracing::info!(%installed, %previous, "installed refreshed key snapshot");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "rejected refreshed key material; keeping current snapshot");
                }
            }
        }
        tracing::debug!("key update channel closed; installer exiting");
    })
}
