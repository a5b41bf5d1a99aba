use std::future::Future;

use async_trait::async_trait;

use crate::error::Result;

/// Where refreshed key material comes from
///
/// Implementations may perform network I/O. They are trusted for content
/// but not for latency, so callers bound them with a timeout.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// The raw description type this source produces
    type Output: Send + 'static;

    /// Fetch the latest key material
    async fn fetch(&self) -> Result<Self::Output>;
}

/// Adapter turning an async closure into a [`KeySource`]
///
/// ```rust
/// use keyturn::{FnKeySource, KeySet, KeySource};
///
/// # async fn example() -> keyturn::Result<()> {
/// let source = FnKeySource::new(|| async { Ok::<_, keyturn::Error>(KeySet::default()) });
/// let keys = source.fetch().await?;
/// assert!(keys.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct FnKeySource<F> {
    fetch: F,
}

impl<F> FnKeySource<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<F, Fut, T> KeySource for FnKeySource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
    T: Send + 'static,
{
    type Output = T;

    async fn fetch(&self) -> Result<T> {
        (self.fetch)().await
    }
}
