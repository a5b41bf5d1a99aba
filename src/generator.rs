use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::Header;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::cache::spawn_installer;
use crate::cache::KeyCache;
use crate::claims::TokenClaims;
use crate::config::GeneratorConfig;
use crate::description::PrivateKeyDescription;
use crate::error::Error;
use crate::error::Result;
use crate::refresher::fetch_with_timeout;
use crate::refresher::Refresher;
use crate::refresher::RefresherState;
use crate::snapshot::SigningKey;
use crate::source::KeySource;

/// Trait for token issuance
#[async_trait]
pub trait GenerateToken {
    /// Issue a token for the configured subject
    async fn generate(&self) -> Result<String>;

    /// Issue a token for the given subject
    async fn generate_for(&self, subject: &str) -> Result<String>;
}

/// Issues tokens signed with the current signing key
///
/// The signing key is fetched once at construction and then refreshed in the
/// background. Issuing a token only takes a read lock on the key cache.
pub struct TokenGenerator<S>
where
    S: KeySource<Output = PrivateKeyDescription>,
{
    cache: KeyCache<SigningKey>,
    refresher: Refresher<S>,
    installer: Mutex<Option<JoinHandle<()>>>,
    subject: String,
    token_ttl: Duration,
}

impl<S> TokenGenerator<S>
where
    S: KeySource<Output = PrivateKeyDescription> + 'static,
{
    /// Fetch the initial signing key and start refreshing it in the background
    ///
    /// # Errors
    /// Fails if the initial fetch fails or the fetched key does not decode;
    /// a generator never starts without a usable key.
    pub async fn new(config: GeneratorConfig, source: S) -> Result<Self> {
        let source = Arc::new(source);

        let initial = fetch_with_timeout(&*source, config.fetch_timeout).await?;
        let signing_key = SigningKey::from_description(&initial)?;
        tracing::info!(kid = signing_key.kid(), "initial signing key installed");

        let cache = KeyCache::new(signing_key);

        let (mut refresher, updates) = Refresher::channel(config.refresh_interval, source);
        if let Some(timeout) = config.fetch_timeout {
            refresher = refresher.with_fetch_timeout(timeout);
        }

        let installer = spawn_installer(cache.clone(), updates, |description: PrivateKeyDescription| {
            SigningKey::from_description(&description)
        });
        refresher.start()?;

        Ok(Self {
            cache,
            refresher,
            installer: Mutex::new(Some(installer)),
            subject: config.subject,
            token_ttl: config.token_ttl,
        })
    }

    /// Identifier of the key tokens are currently signed with
    pub async fn current_kid(&self) -> String {
        self.cache.current().await.kid().to_string()
    }

    pub fn cache(&self) -> &KeyCache<SigningKey> {
        &self.cache
    }

    pub fn refresher_state(&self) -> RefresherState {
        self.refresher.state()
    }

    /// Stop background refreshing and wait for it to wind down
    ///
    /// Tokens can still be issued afterwards with the last installed key.
    pub async fn shutdown(&self) {
        self.refresher.stop().await;

        let installer = self.installer.lock().take();
        if let Some(installer) = installer {
            if let Err(err) = installer.await {
                tracing::warn!(error = %err, "signing key installer panicked");
            }
        }
    }
}

#[async_trait]
impl<S> GenerateToken for TokenGenerator<S>
where
    S: KeySource<Output = PrivateKeyDescription> + 'static,
{
    async fn generate(&self) -> Result<String> {
        self.generate_for(&self.subject).await
    }

    async fn generate_for(&self, subject: &str) -> Result<String> {
        let signing_key = self.cache.current().await;

        let claims = TokenClaims::issue(subject, Utc::now().timestamp(), self.token_ttl);

        let mut header = Header::new(signing_key.algorithm());
        header.kid = Some(signing_key.kid().to_string());

        let token = jsonwebtoken::encode(&header, &claims, signing_key.encoding_key())
            .map_err(Error::Signing)?;

        tracing::debug!(kid = signing_key.kid(), exp = claims.exp, "issued token");

        Ok(token)
    }
}
