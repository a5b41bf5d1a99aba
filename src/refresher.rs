//! Timer-driven background fetching of key material
//!
//! A [`Refresher`] owns one background task. On every tick it calls its
//! [`KeySource`] and publishes successful results on a bounded channel whose
//! single consumer installs them into a [`KeyCache`](crate::KeyCache).
//!
//! ```text
//! Idle --start()--> Running --stop() / consumer gone--> Stopped
//! ```
//!
//! A failed fetch is logged and the loop keeps ticking. Publishing waits for
//! the consumer instead of dropping updates.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::error::Result;
use crate::source::KeySource;

/// Capacity of the channel between refresher and cache
pub const UPDATE_CHANNEL_CAPACITY: usize = 1;

/// Shortest tick period a refresher will run with
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// Observable lifecycle of a [`Refresher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefresherState {
    Idle,
    Running,
    Stopped,
}

enum Lifecycle<T> {
    Idle(mpsc::Sender<T>),
    Running(JoinHandle<()>),
    Stopped,
}

/// Periodically fetches key material and publishes it on a channel
pub struct Refresher<S: KeySource> {
    interval: Duration,
    fetch_timeout: Option<Duration>,
    source: Arc<S>,
    lifecycle: Mutex<Lifecycle<S::Output>>,
    cancel_token: CancellationToken,
}

impl<S: KeySource + 'static> Refresher<S> {
    /// Create an idle refresher publishing onto `output`
    pub fn new(interval: Duration, source: Arc<S>, output: mpsc::Sender<S::Output>) -> Self {
        Self {
            interval: interval.max(MIN_REFRESH_INTERVAL),
            fetch_timeout: None,
            source,
            lifecycle: Mutex::new(Lifecycle::Idle(output)),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Create an idle refresher together with the receiving end of its channel
    pub fn channel(interval: Duration, source: Arc<S>) -> (Self, mpsc::Receiver<S::Output>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        (Self::new(interval, source, tx), rx)
    }

    /// Abandon any fetch that takes longer than `timeout`
    ///
    /// Without a timeout, [`stop`](Self::stop) waits for an in-flight fetch
    /// for as long as the source takes.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Spawn the refresh loop
    ///
    /// The first fetch happens one full interval after this call.
    ///
    /// # Errors
    /// - `Error::RefresherAlreadyStarted` if the loop is already running
    /// - `Error::RefresherStopped` if the refresher was stopped
    ///
    /// # Panics
    /// Must be called within a Tokio runtime context.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();

        let output = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle(output) => output,
            Lifecycle::Running(handle) => {
                *lifecycle = Lifecycle::Running(handle);
                return Err(Error::RefresherAlreadyStarted);
            }
            Lifecycle::Stopped => return Err(Error::RefresherStopped),
        };

        let handle = tokio::spawn(refresh_loop(
            Arc::clone(&self.source),
            output,
            self.interval,
            self.fetch_timeout,
            self.cancel_token.clone(),
        ));
        *lifecycle = Lifecycle::Running(handle);

        Ok(())
    }

    /// Stop the loop and wait for the background task to exit
    ///
    /// An in-flight fetch is not interrupted; the loop exits at the next tick,
    /// fetch or publish boundary. The output channel is closed once this
    /// returns. Calling `stop` again is a no-op.
    pub async fn stop(&self) {
        self.cancel_token.cancel();

        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Stopped);

        if let Lifecycle::Running(handle) = previous {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "key refresher task panicked");
            }
        }
    }

    pub fn state(&self) -> RefresherState {
        match &*self.lifecycle.lock() {
            Lifecycle::Idle(_) => RefresherState::Idle,
            Lifecycle::Running(handle) if handle.is_finished() => RefresherState::Stopped,
            Lifecycle::Running(_) => RefresherState::Running,
            Lifecycle::Stopped => RefresherState::Stopped,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S: KeySource> Drop for Refresher<S> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Fetch once, bounded by `timeout` when one is set
pub(crate) async fn fetch_with_timeout<S>(source: &S, timeout: Option<Duration>) -> Result<S::Output>
where
    S: KeySource + ?Sized,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch())
            .await
            .map_err(|_| Error::Fetch(format!("fetch did not complete within {limit:?}")))?,
        None => source.fetch().await,
    }
}

async fn refresh_loop<S: KeySource>(
    source: Arc<S>,
    output: mpsc::Sender<S::Output>,
    interval: Duration,
    fetch_timeout: Option<Duration>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_ms = interval.as_millis() as u64, "key refresher started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetched = match fetch_with_timeout(&*source, fetch_timeout).await {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::warn!(error = %err, "key refresh failed; keeping current snapshot");
                continue;
            }
        };

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            sent = output.send(fetched) => {
                if sent.is_err() {
                    tracing::info!("key cache consumer is gone");
                    break;
                }
                tracing::debug!("published refreshed key material");
            }
        }
    }

    tracing::info!("key refresher stopped");
}
