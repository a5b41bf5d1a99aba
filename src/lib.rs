//! # Keyturn
//!
//! A Rust library for issuing and validating RSA-signed JWTs with keys that are
//! rotated from an external publishing source.
//!
//! Both sides keep their key material in a [`KeyCache`] that a background
//! [`Refresher`] updates on a timer, so issuing or validating a token never
//! waits on network I/O.
//!
//! ## Features
//!
//! - Token issuance with a fixed validity window and the signing key's `kid` in the header
//! - Token validation against a trusted key set, selected by `kid`
//! - JWK-style key descriptions decoded to RSA keys, with private key consistency checks
//! - Background refresh that keeps the last good keys when a fetch fails
//! - Object storage key source over HTTP(S)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use keyturn::providers::object_store::{ObjectStoreConfig, ObjectStoreKeySource};
//! use keyturn::{GenerateToken, GeneratorConfig, TokenGenerator, TokenValidator, ValidateToken, ValidatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ObjectStoreKeySource::new(ObjectStoreConfig::new(
//!         "https://shared-bucket.example.com/.well-known/jwks.json",
//!         "https://private-bucket.example.com",
//!     ))?;
//!
//!     let generator = TokenGenerator::new(
//!         GeneratorConfig::new("my-service").with_refresh_interval(Duration::from_secs(300)),
//!         store.signing_keys(),
//!     )
//!     .await?;
//!     let validator = TokenValidator::new(ValidatorConfig::new(), store.key_sets()).await?;
//!
//!     let token = generator.generate().await?;
//!     let claims = validator.validate(&token).await?;
//!     println!("Token issued for {}, expires at {}", claims.sub, claims.exp);
//!
//!     generator.shutdown().await;
//!     validator.shutdown().await;
//!     Ok(())
//! }
//! ```

mod cache;
mod claims;
mod codec;
mod config;
mod description;
mod error;
mod generator;
mod refresher;
mod snapshot;
mod source;
mod validator;

pub mod providers;

// Re-exports for public API
pub use cache::KeyCache;
pub use claims::TokenClaims;
pub use codec::decode_private;
pub use codec::decode_private_pem;
pub use codec::decode_public;
pub use codec::decode_public_pem;
pub use codec::decode_uint;
pub use codec::encode_private;
pub use codec::encode_public;
pub use codec::encode_uint;
pub use codec::parse_algorithm;
pub use config::GeneratorConfig;
pub use config::ValidatorConfig;
pub use config::DEFAULT_FETCH_TIMEOUT;
pub use config::DEFAULT_REFRESH_INTERVAL;
pub use config::DEFAULT_TOKEN_TTL;
pub use description::KeySet;
pub use description::PrivateKeyDescription;
pub use description::PublicKeyDescription;
pub use error::Error;
pub use error::Result;
pub use generator::GenerateToken;
pub use generator::TokenGenerator;
pub use refresher::Refresher;
pub use refresher::RefresherState;
pub use snapshot::SigningKey;
pub use snapshot::TrustedKey;
pub use snapshot::TrustedKeySet;
pub use source::FnKeySource;
pub use source::KeySource;
pub use validator::TokenValidator;
pub use validator::ValidateToken;

// Callers build keys and algorithms with the same crates this library uses.
pub use jsonwebtoken::Algorithm;
pub use rsa::RsaPrivateKey;
pub use rsa::RsaPublicKey;
