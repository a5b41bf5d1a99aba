use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::dangerous;
use jsonwebtoken::decode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::TokenData;
use jsonwebtoken::Validation;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::cache::spawn_installer;
use crate::cache::KeyCache;
use crate::claims::TokenClaims;
use crate::config::ValidatorConfig;
use crate::description::KeySet;
use crate::error::Error;
use crate::error::Result;
use crate::refresher::fetch_with_timeout;
use crate::refresher::Refresher;
use crate::refresher::RefresherState;
use crate::snapshot::TrustedKey;
use crate::snapshot::TrustedKeySet;
use crate::source::KeySource;

/// Trait for token validation
#[async_trait]
pub trait ValidateToken {
    /// Validate a token and return its claims
    ///
    /// `Ok` means every check passed: accepted algorithm, unexpired, known
    /// key identifier and matching signature.
    async fn validate(&self, token: &str) -> Result<TokenClaims>;

    /// Whether the token passes [`validate`](Self::validate)
    async fn is_valid(&self, token: &str) -> bool {
        self.validate(token).await.is_ok()
    }
}

/// Validates tokens against the current trusted key set
///
/// The key set is fetched once at construction and then refreshed in the
/// background. Validating a token only takes a read lock on the key cache.
pub struct TokenValidator<S>
where
    S: KeySource<Output = KeySet>,
{
    cache: KeyCache<TrustedKeySet>,
    refresher: Refresher<S>,
    installer: Mutex<Option<JoinHandle<()>>>,
    accepted_algorithms: Vec<Algorithm>,
}

impl<S> TokenValidator<S>
where
    S: KeySource<Output = KeySet> + 'static,
{
    /// Fetch the initial trusted key set and start refreshing it in the background
    ///
    /// # Errors
    /// Fails if the initial fetch fails. Entries that do not decode are
    /// skipped, so a set without usable keys still constructs and rejects
    /// every token with `KeyNotFound`.
    pub async fn new(config: ValidatorConfig, source: S) -> Result<Self> {
        let source = Arc::new(source);

        let initial = fetch_with_timeout(&*source, config.fetch_timeout).await?;
        let trusted = TrustedKeySet::from_key_set(&initial);
        tracing::info!(kids = %trusted, "initial trusted key set installed");

        let cache = KeyCache::new(trusted);

        let (mut refresher, updates) = Refresher::channel(config.refresh_interval, source);
        if let Some(timeout) = config.fetch_timeout {
            refresher = refresher.with_fetch_timeout(timeout);
        }

        let installer = spawn_installer(cache.clone(), updates, |key_set: KeySet| {
            Ok(TrustedKeySet::from_key_set(&key_set))
        });
        refresher.start()?;

        Ok(Self {
            cache,
            refresher,
            installer: Mutex::new(Some(installer)),
            accepted_algorithms: config.accepted_algorithms,
        })
    }

    /// Identifiers in the current trusted key set, in set order
    pub async fn trusted_kids(&self) -> Vec<String> {
        self.cache
            .current()
            .await
            .kids()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn cache(&self) -> &KeyCache<TrustedKeySet> {
        &self.cache
    }

    pub fn refresher_state(&self) -> RefresherState {
        self.refresher.state()
    }

    /// Stop background refreshing and wait for it to wind down
    ///
    /// Tokens can still be validated afterwards against the last installed set.
    pub async fn shutdown(&self) {
        self.refresher.stop().await;

        let installer = self.installer.lock().take();
        if let Some(installer) = installer {
            if let Err(err) = installer.await {
                tracing::warn!(error = %err, "trusted key set installer panicked");
            }
        }
    }

    /// Parse token data without signature validation to read header and claims
    fn parse_token_data(&self, token: &str) -> Result<TokenData<TokenClaims>> {
        // Only used for the cheap checks; the signature is verified in verify_signature()
        let token_data = dangerous::insecure_decode::<TokenClaims>(token)?;
        Ok(token_data)
    }
}

#[async_trait]
impl<S> ValidateToken for TokenValidator<S>
where
    S: KeySource<Output = KeySet> + 'static,
{
    async fn validate(&self, token: &str) -> Result<TokenClaims> {
        let TokenData { header, claims } = self.parse_token_data(token)?;

        if !self.accepted_algorithms.contains(&header.alg) {
            return Err(Error::AlgorithmMismatch(format!("{:?}", header.alg)));
        }

        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(Error::TokenExpired(claims.exp));
        }

        let kid = header.kid.ok_or(Error::KeyIdMissing)?;

        let trusted = self.cache.current().await;
        let key = trusted
            .find(&kid)
            .ok_or_else(|| Error::KeyNotFound(kid.clone()))?;

        if key.algorithm() != header.alg {
            return Err(Error::AlgorithmMismatch(format!("{:?}", header.alg)));
        }

        let claims = verify_signature(token, header.alg, key, claims.exp)?;
        tracing::debug!(kid, sub = %claims.sub, "validated token");

        Ok(claims)
    }
}

/// Verify the signature and expiry with the resolved key
fn verify_signature(
    token: &str,
    algorithm: Algorithm,
    key: &TrustedKey,
    exp: i64,
) -> Result<TokenClaims> {
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    let token_data =
        decode::<TokenClaims>(token, key.decoding_key(), &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::InvalidSignature => Error::SignatureMismatch,
                ErrorKind::ExpiredSignature => Error::TokenExpired(exp),
                _ => Error::Jwt(err),
            }
        })?;

    Ok(token_data.claims)
}
