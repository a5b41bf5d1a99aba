//! Key material published to object storage and served over HTTP(S)
//!
//! The publisher writes two kinds of documents:
//!
//! - an index document listing the public keys, e.g. `.well-known/jwks.json`:
//!
//! ```json
//! { "keys": [ { "alg": "RS256", "kid": "2025-06", "kty": "RSA", "n": "...", "e": "AQAB", "use": "sig" } ] }
//! ```
//!
//! - one private document per key, named after its `kid`
//!   (`jwk-private-{kid}.json` by default), usually in a separate bucket.
//!
//! The first key listed in the index is the active signing key.
//!
//! ## Example
//!
//! ```rust,no_run
//! use keyturn::providers::object_store::{ObjectStoreConfig, ObjectStoreKeySource};
//! use keyturn::{GeneratorConfig, TokenGenerator, TokenValidator, ValidatorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ObjectStoreKeySource::new(ObjectStoreConfig::new(
//!     "https://shared-bucket.example.com/.well-known/jwks.json",
//!     "https://private-bucket.example.com",
//! ))?;
//!
//! let generator = TokenGenerator::new(GeneratorConfig::new("my-service"), store.signing_keys()).await?;
//! let validator = TokenValidator::new(ValidatorConfig::new(), store.key_sets()).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::Client;

use crate::config::DEFAULT_FETCH_TIMEOUT;
use crate::description::KeySet;
use crate::description::PrivateKeyDescription;
use crate::error::decode_error;
use crate::error::fetch_index_error;
use crate::error::fetch_private_key_error;
use crate::error::Error;
use crate::error::Result;
use crate::source::KeySource;

/// Object name of a private key document; `{kid}` is replaced by the key identifier
pub const DEFAULT_PRIVATE_KEY_TEMPLATE: &str = "jwk-private-{kid}.json";

/// Where the key documents live
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Full URL of the index document
    pub(crate) index_url: String,
    /// Base URL private key documents are resolved against
    pub(crate) private_key_base_url: String,
    /// Object name template for private key documents
    pub(crate) private_key_template: String,
    /// Optional custom HTTP client
    /// If not provided, a client with a 10 second timeout will be created
    pub(crate) http_client: Option<Client>,
}

impl ObjectStoreConfig {
    pub fn new(index_url: impl Into<String>, private_key_base_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            private_key_base_url: private_key_base_url.into(),
            private_key_template: DEFAULT_PRIVATE_KEY_TEMPLATE.to_string(),
            http_client: None,
        }
    }

    /// Set the object name template for private key documents
    pub fn with_private_key_template(mut self, template: impl Into<String>) -> Self {
        self.private_key_template = template.into();
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Reads key documents from object storage
#[derive(Debug, Clone)]
pub struct ObjectStoreKeySource {
    client: Client,
    index_url: String,
    private_key_base_url: String,
    private_key_template: String,
}

impl ObjectStoreKeySource {
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder().timeout(DEFAULT_FETCH_TIMEOUT).build()?,
        };

        Ok(Self {
            client,
            index_url: config.index_url,
            private_key_base_url: config.private_key_base_url,
            private_key_template: config.private_key_template,
        })
    }

    /// Fetch and parse the index document
    pub async fn fetch_key_set(&self) -> Result<KeySet> {
        let body = self
            .client
            .get(&self.index_url)
            .send()
            .await
            .map_err(fetch_index_error)?
            .error_for_status()
            .map_err(fetch_index_error)?
            .bytes()
            .await
            .map_err(fetch_index_error)?;

        KeySet::from_json(&body)
    }

    /// Fetch the private document of the first key listed in the index
    pub async fn fetch_signing_key(&self) -> Result<PrivateKeyDescription> {
        let key_set = self.fetch_key_set().await?;
        let kid = key_set
            .keys
            .first()
            .map(|key| key.kid.clone())
            .ok_or_else(|| Error::Fetch("index document lists no keys".to_string()))?;

        let body = self
            .client
            .get(self.private_key_url(&kid))
            .send()
            .await
            .map_err(fetch_private_key_error)?
            .error_for_status()
            .map_err(fetch_private_key_error)?
            .bytes()
            .await
            .map_err(fetch_private_key_error)?;

        let description = PrivateKeyDescription::from_json(&body)?;
        if description.kid != kid {
            return Err(decode_error(
                "kid",
                format!("private document for '{kid}' describes '{}'", description.kid),
            ));
        }

        tracing::debug!(kid, "fetched private key document");
        Ok(description)
    }

    /// Key source for a [`TokenValidator`](crate::TokenValidator)
    pub fn key_sets(&self) -> KeySetSource {
        KeySetSource(self.clone())
    }

    /// Key source for a [`TokenGenerator`](crate::TokenGenerator)
    pub fn signing_keys(&self) -> SigningKeySource {
        SigningKeySource(self.clone())
    }

    fn private_key_url(&self, kid: &str) -> String {
        format!(
            "{}/{}",
            self.private_key_base_url.trim_end_matches('/'),
            self.private_key_template.replace("{kid}", kid)
        )
    }
}

/// Serves the index document as a [`KeySet`]
#[derive(Debug, Clone)]
pub struct KeySetSource(ObjectStoreKeySource);

#[async_trait]
impl KeySource for KeySetSource {
    type Output = KeySet;

    async fn fetch(&self) -> Result<KeySet> {
        self.0.fetch_key_set().await
    }
}

/// Serves the active signing key's private document
#[derive(Debug, Clone)]
pub struct SigningKeySource(ObjectStoreKeySource);

#[async_trait]
impl KeySource for SigningKeySource {
    type Output = PrivateKeyDescription;

    async fn fetch(&self) -> Result<PrivateKeyDescription> {
        self.0.fetch_signing_key().await
    }
}
