//! Conversion between portable key descriptions and numeric RSA keys
//!
//! Every large-integer field is unpadded base64url text. Documents that use
//! the standard alphabet (`+`, `/`) or padding are rejected as malformed
//! rather than guessed at.
//!
//! All functions here are pure and can be called concurrently.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::Algorithm;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::traits::PrivateKeyParts;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;

use crate::description::PrivateKeyDescription;
use crate::description::PublicKeyDescription;
use crate::error::decode_error;
use crate::error::key_invalid_error;
use crate::error::Error;
use crate::error::Result;

/// The only key type tag accepted in descriptions
pub const RSA_KEY_TYPE: &str = "RSA";

/// Usage tag written into encoded public descriptions
pub const SIGNATURE_USE: &str = "sig";

/// Algorithm assumed when a description leaves `alg` empty
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Decode one base64url field into an unsigned big integer
pub fn decode_uint(field: &'static str, value: &str) -> Result<BigUint> {
    if value.is_empty() {
        return Err(decode_error(field, "field is empty"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|err| decode_error(field, err))?;

    Ok(BigUint::from_bytes_be(&bytes))
}

/// Encode an unsigned big integer as unpadded base64url
pub fn encode_uint(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

/// Parse an `alg` tag, requiring the RSA signature family
pub fn parse_algorithm(alg: &str) -> Result<Algorithm> {
    if alg.is_empty() {
        return Ok(DEFAULT_ALGORITHM);
    }

    let algorithm: Algorithm = alg
        .parse()
        .map_err(|_| Error::AlgorithmMismatch(alg.to_string()))?;

    if !is_rsa_family(algorithm) {
        return Err(Error::AlgorithmMismatch(alg.to_string()));
    }

    Ok(algorithm)
}

pub fn is_rsa_family(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

/// Build a public key from the modulus and public exponent
///
/// No arithmetic validation happens here; a key that decodes is returned as is.
pub fn decode_public(description: &PublicKeyDescription) -> Result<RsaPublicKey> {
    check_key_type(&description.kty)?;

    let n = decode_uint("n", &description.n)?;
    let e = decode_uint("e", &description.e)?;

    Ok(RsaPublicKey::new_unchecked(n, e))
}

/// Build a private key and check that its components are consistent
///
/// # Errors
/// - `Error::Decode` if a field is missing, empty or not base64url
/// - `Error::KeyInvalid` if `n != p*q`, if `d*e != 1 mod lambda(n)`, or if
///   supplied CRT parameters disagree with the derived ones
pub fn decode_private(description: &PrivateKeyDescription) -> Result<RsaPrivateKey> {
    check_key_type(&description.kty)?;
    let kid = description.kid.as_str();

    let n = decode_uint("n", &description.n)?;
    let e = decode_uint("e", &description.e)?;
    let d = decode_uint("d", &description.d)?;
    let p = decode_uint("p", &description.p)?;
    let q = decode_uint("q", &description.q)?;

    if &p * &q != n {
        return Err(key_invalid_error(
            kid,
            "modulus is not the product of the two primes",
        ));
    }

    let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
        .map_err(|err| key_invalid_error(kid, err))?;

    // Checks d*e == 1 modulo (p-1) and (q-1), which is the lambda(n) law for n = p*q.
    key.validate().map_err(|err| key_invalid_error(kid, err))?;

    check_crt_parameters(description, &key)?;

    Ok(key)
}

/// Describe a public key, tagged for signature use
pub fn encode_public(kid: &str, algorithm: Algorithm, key: &RsaPublicKey) -> PublicKeyDescription {
    PublicKeyDescription {
        alg: format!("{algorithm:?}"),
        kid: kid.to_string(),
        kty: RSA_KEY_TYPE.to_string(),
        n: encode_uint(key.n()),
        e: encode_uint(key.e()),
        key_use: Some(SIGNATURE_USE.to_string()),
    }
}

/// Describe a two-prime private key, including CRT parameters when available
pub fn encode_private(kid: &str, algorithm: Algorithm, key: &RsaPrivateKey) -> PrivateKeyDescription {
    let primes = key.primes();

    PrivateKeyDescription {
        kty: RSA_KEY_TYPE.to_string(),
        kid: kid.to_string(),
        alg: format!("{algorithm:?}"),
        n: encode_uint(key.n()),
        e: encode_uint(key.e()),
        d: encode_uint(key.d()),
        p: primes.first().map(encode_uint).unwrap_or_default(),
        q: primes.get(1).map(encode_uint).unwrap_or_default(),
        dp: key.dp().map(encode_uint),
        dq: key.dq().map(encode_uint),
        qi: key
            .qinv()
            .map(|qinv| URL_SAFE_NO_PAD.encode(qinv.to_bytes_be().1)),
    }
}

/// Decode a PKCS#1 PEM public key (`BEGIN RSA PUBLIC KEY`)
pub fn decode_public_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_pkcs1_pem(pem).map_err(|err| decode_error("pem", err))
}

/// Decode a PKCS#1 PEM private key (`BEGIN RSA PRIVATE KEY`) under the given identifier
pub fn decode_private_pem(kid: &str, pem: &str) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_pkcs1_pem(pem).map_err(|err| decode_error("pem", err))?;
    key.validate().map_err(|err| key_invalid_error(kid, err))?;
    Ok(key)
}

fn check_key_type(kty: &str) -> Result<()> {
    if kty != RSA_KEY_TYPE {
        return Err(decode_error("kty", format!("unsupported key type '{kty}'")));
    }
    Ok(())
}

fn check_crt_parameters(description: &PrivateKeyDescription, key: &RsaPrivateKey) -> Result<()> {
    let kid = description.kid.as_str();

    if let Some(dp) = &description.dp {
        let dp = decode_uint("dp", dp)?;
        if key.dp() != Some(&dp) {
            return Err(key_invalid_error(kid, "dp does not match d mod (p-1)"));
        }
    }

    if let Some(dq) = &description.dq {
        let dq = decode_uint("dq", dq)?;
        if key.dq() != Some(&dq) {
            return Err(key_invalid_error(kid, "dq does not match d mod (q-1)"));
        }
    }

    if let Some(qi) = &description.qi {
        let qi = decode_uint("qi", qi)?.to_bytes_be();
        let derived = key.qinv().map(|qinv| qinv.to_bytes_be().1);
        if derived.as_deref() != Some(qi.as_slice()) {
            return Err(key_invalid_error(kid, "qi does not match q^-1 mod p"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_uint_reads_base64url() {
        assert_eq!(decode_uint("e", "AQAB").unwrap(), BigUint::from(65537u32));
    }

    #[test]
    fn decode_uint_rejects_standard_alphabet_and_padding() {
        assert!(matches!(
            decode_uint("n", "ab+/"),
            Err(Error::Decode { field: "n", .. })
        ));
        assert!(matches!(
            decode_uint("e", "AQ=="),
            Err(Error::Decode { field: "e", .. })
        ));
    }

    #[test]
    fn decode_uint_rejects_empty_field() {
        assert!(matches!(
            decode_uint("d", ""),
            Err(Error::Decode { field: "d", .. })
        ));
    }

    #[test]
    fn encode_uint_is_inverse_of_decode() {
        let value = BigUint::from(0xdead_beef_u64);
        assert_eq!(decode_uint("n", &encode_uint(&value)).unwrap(), value);
    }

    #[test]
    fn parse_algorithm_accepts_rsa_family_only() {
        assert_eq!(parse_algorithm("").unwrap(), Algorithm::RS256);
        assert_eq!(parse_algorithm("PS384").unwrap(), Algorithm::PS384);
        assert!(matches!(
            parse_algorithm("HS256"),
            Err(Error::AlgorithmMismatch(_))
        ));
        assert!(matches!(
            parse_algorithm("ES256"),
            Err(Error::AlgorithmMismatch(_))
        ));
        assert!(matches!(
            parse_algorithm("nonsense"),
            Err(Error::AlgorithmMismatch(_))
        ));
    }

    #[test]
    fn decode_public_rejects_other_key_types() {
        let description = PublicKeyDescription {
            alg: "RS256".into(),
            kid: "k".into(),
            kty: "EC".into(),
            n: "AQAB".into(),
            e: "AQAB".into(),
            key_use: None,
        };

        assert!(matches!(
            decode_public(&description),
            Err(Error::Decode { field: "kty", .. })
        ));
    }
}
