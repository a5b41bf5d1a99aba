use serde::Deserialize;
use serde::Serialize;

use crate::error::decode_error;
use crate::error::Result;

/// Portable description of an RSA private key (JWK field names)
///
/// All large-integer fields hold unpadded base64url text. The CRT parameters
/// are optional; when absent they are derived during decoding.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyDescription {
    pub kty: String,
    pub kid: String,
    #[serde(default)]
    pub alg: String,
    pub n: String,
    pub e: String,
    pub d: String,
    pub p: String,
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl PrivateKeyDescription {
    /// Parse a private key document
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|err| decode_error("document", err))
    }
}

// Hand-written so that private exponents and primes never reach log output.
impl std::fmt::Debug for PrivateKeyDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyDescription")
            .field("kty", &self.kty)
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for PrivateKeyDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} private key '{}' ({})", self.kty, self.kid, self.alg)
    }
}

/// Portable description of an RSA public key (JWK field names)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyDescription {
    #[serde(default)]
    pub alg: String,
    pub kid: String,
    pub kty: String,
    pub n: String,
    pub e: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl PublicKeyDescription {
    /// Parse a single public key document
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|err| decode_error("document", err))
    }
}

/// Ordered set of public key descriptions, as published in the index document
///
/// Identifiers are expected to be unique. When they are not, lookups resolve
/// to the first entry carrying the identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    pub keys: Vec<PublicKeyDescription>,
}

impl KeySet {
    pub fn new(keys: Vec<PublicKeyDescription>) -> Self {
        Self { keys }
    }

    /// Parse an index document of the form `{"keys": [...]}`
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|err| decode_error("document", err))
    }

    /// First description with the given key identifier
    pub fn find(&self, kid: &str) -> Option<&PublicKeyDescription> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| key.kid.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
