use std::fmt;

use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;

use crate::codec;
use crate::description::KeySet;
use crate::description::PrivateKeyDescription;
use crate::description::PublicKeyDescription;
use crate::error::decode_error;
use crate::error::key_invalid_error;
use crate::error::Error;
use crate::error::Result;

/// The decoded private key tokens are currently signed with
pub struct SigningKey {
    kid: String,
    algorithm: Algorithm,
    key: RsaPrivateKey,
    encoding_key: EncodingKey,
}

impl SigningKey {
    /// Decode and check a private key description
    pub fn from_description(description: &PrivateKeyDescription) -> Result<Self> {
        let algorithm = codec::parse_algorithm(&description.alg)?;
        let key = codec::decode_private(description)?;
        Self::new(description.kid.clone(), algorithm, key)
    }

    pub fn new(kid: impl Into<String>, algorithm: Algorithm, key: RsaPrivateKey) -> Result<Self> {
        let kid = kid.into();

        if !codec::is_rsa_family(algorithm) {
            return Err(Error::AlgorithmMismatch(format!("{algorithm:?}")));
        }

        let der = key
            .to_pkcs1_der()
            .map_err(|err| key_invalid_error(&kid, err))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        Ok(Self {
            kid,
            algorithm,
            key,
            encoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// Public half of this key, ready to be published in a key set
    pub fn public_description(&self) -> PublicKeyDescription {
        codec::encode_public(&self.kid, self.algorithm, &self.key.to_public_key())
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.kid, self.algorithm)
    }
}

/// One verification key from the trusted set
pub struct TrustedKey {
    kid: String,
    algorithm: Algorithm,
    key: RsaPublicKey,
    decoding_key: DecodingKey,
}

impl TrustedKey {
    pub fn from_description(description: &PublicKeyDescription) -> Result<Self> {
        if let Some(key_use) = description.key_use.as_deref() {
            if key_use != codec::SIGNATURE_USE {
                return Err(decode_error("use", format!("key is published for '{key_use}'")));
            }
        }

        let algorithm = codec::parse_algorithm(&description.alg)?;
        let key = codec::decode_public(description)?;
        let decoding_key =
            DecodingKey::from_rsa_raw_components(&key.n().to_bytes_be(), &key.e().to_bytes_be());

        Ok(Self {
            kid: description.kid.clone(),
            algorithm,
            key,
            decoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// The set of keys tokens are currently verified against
///
/// Entries are decoded one by one when the set is built. An entry that is not
/// a usable RSA signature key is logged and left out; the rest of the set is
/// still installed. An empty set trusts nothing.
#[derive(Debug, Default)]
pub struct TrustedKeySet {
    keys: Vec<TrustedKey>,
}

impl TrustedKeySet {
    pub fn from_key_set(key_set: &KeySet) -> Self {
        let keys = key_set
            .keys
            .iter()
            .filter_map(|description| match TrustedKey::from_description(description) {
                Ok(key) => Some(key),
                Err(err) => {
                    tracing::warn!(kid = %description.kid, error = %err, "skipping unusable key in key set");
                    None
                }
            })
            .collect();

        Self { keys }
    }

    /// First key with the given identifier, in set order
    pub fn find(&self, kid: &str) -> Option<&TrustedKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    pub fn kids(&self) -> Vec<&str> {
        self.keys.iter().map(|key| key.kid.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for TrustedKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kids().join(", "))
    }
}
