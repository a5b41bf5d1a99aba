use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed key description field '{field}': {reason}")]
    Decode { field: &'static str, reason: String },
    #[error("Key '{kid}' failed the RSA consistency check: {reason}")]
    KeyInvalid { kid: String, reason: String },
    #[error("Fetching key material failed: {0}")]
    Fetch(String),
    #[error("Signing the token failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("The provided JWT has expired. Expiration timestamp: {0}")]
    TokenExpired(i64),
    #[error("Missing 'kid' in the header of the provided JWT")]
    KeyIdMissing,
    #[error("No trusted key matches kid '{0}'")]
    KeyNotFound(String),
    #[error("The JWT signature does not match the trusted key")]
    SignatureMismatch,
    #[error("Only RSA signing algorithms are supported, got: {0}")]
    AlgorithmMismatch(String),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error(
        "No algorithms configured - at least one accepted RSA algorithm must be configured"
    )]
    NoAlgorithmsConfigured,
    #[error("The key refresher has already been started")]
    RefresherAlreadyStarted,
    #[error("The key refresher has been stopped and cannot be restarted")]
    RefresherStopped,
}

pub(crate) fn decode_error(field: &'static str, reason: impl ToString) -> Error {
    Error::Decode {
        field,
        reason: reason.to_string(),
    }
}

pub(crate) fn key_invalid_error(kid: &str, reason: impl ToString) -> Error {
    Error::KeyInvalid {
        kid: kid.to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn fetch_index_error(error: reqwest::Error) -> Error {
    Error::Fetch(format!("Failed to fetch key index document: {error}"))
}

pub(crate) fn fetch_private_key_error(error: reqwest::Error) -> Error {
    Error::Fetch(format!("Failed to fetch private key document: {error}"))
}
