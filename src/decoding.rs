use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::RsaPublicKey;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::algorithms::{HMAC_ALGORITHMS, PUBLIC_KEY_ALGORITHMS, RSA_ALGORITHMS};
use crate::crypto;
use crate::crypto::ecdsa::EcVerifyingKey;
use crate::errors::{new_error, ErrorKind, Result};
use crate::headers::Header;
use crate::payload::Payload;
use crate::serialization::{b64_decode, decode_compact};
use crate::validation::{validate, Validation};
use crate::Algorithm;

/// The return type of a successful call to [verify](fn.verify.html) or [decode](fn.decode.html).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    /// The decoded JWT header
    pub header: Header,
    /// The decoded payload
    /// Note: see <https://www.iana.org/assignments/jwt/jwt.xhtml#claims> for many of the properties that you might encounter.
    pub payload: Payload,
    /// The signature segment, still base64url encoded
    pub signature: String,
}

impl TokenData {
    /// Deserializes the payload into your own claims struct.
    pub fn claims<T: DeserializeOwned>(&self) -> Result<T> {
        self.payload.deserialize_claims()
    }
}

/// All the different kind of keys we can use to decode a JWT
/// This key can be re-used so make sure you only initialize it once if you can for better performance
#[derive(Clone)]
pub enum DecodingKey {
    None,
    OctetSeq(Vec<u8>),
    Rsa(rsa::RsaPublicKey),
    Ec(EcVerifyingKey),
}

impl DecodingKey {
    pub fn from_none() -> Self {
        DecodingKey::None
    }

    /// No key at all, or an empty secret
    pub fn is_none(&self) -> bool {
        match self {
            DecodingKey::None => true,
            DecodingKey::OctetSeq(secret) => secret.is_empty(),
            DecodingKey::Rsa(_) | DecodingKey::Ec(_) => false,
        }
    }

    /// If you're using HMAC, use this.
    pub fn from_secret(secret: &[u8]) -> Self {
        DecodingKey::OctetSeq(secret.to_vec())
    }

    /// If you're using HMAC with a base64 encoded, use this.
    pub fn from_base64_secret(secret: &str) -> Result<Self> {
        Ok(DecodingKey::OctetSeq(STANDARD.decode(secret)?))
    }

    pub fn from_rsa(key: rsa::RsaPublicKey) -> Result<Self> {
        Ok(DecodingKey::Rsa(key))
    }

    /// Convenience function for JWKS implementors
    pub fn from_rsa_components(n: &str, e: &str) -> Result<Self> {
        let n = rsa::BigUint::from_bytes_be(&b64_decode(n)?);
        let e = rsa::BigUint::from_bytes_be(&b64_decode(e)?);
        Ok(DecodingKey::Rsa(
            RsaPublicKey::new(n, e).map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?,
        ))
    }

    /// Reads a PKCS#1 (`BEGIN RSA PUBLIC KEY`) or SPKI (`BEGIN PUBLIC KEY`) PEM.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self> {
        use rsa::pkcs1::DecodeRsaPublicKey;
        use rsa::pkcs8::DecodePublicKey;

        let pem = std::str::from_utf8(pem).map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
        let key = if pem.contains("BEGIN RSA PUBLIC KEY") {
            RsaPublicKey::from_pkcs1_pem(pem).ok()
        } else {
            RsaPublicKey::from_public_key_pem(pem).ok()
        };
        key.map(DecodingKey::Rsa).ok_or_else(|| new_error(ErrorKind::InvalidKeyFormat))
    }

    pub fn from_ec(key: EcVerifyingKey) -> Self {
        DecodingKey::Ec(key)
    }

    /// Reads a `BEGIN PUBLIC KEY` PEM on P-256, P-384 or P-521.
    pub fn from_ec_pem(pem: &[u8]) -> Result<Self> {
        let pem = std::str::from_utf8(pem).map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
        Ok(DecodingKey::Ec(EcVerifyingKey::from_pem(pem)?))
    }

    /// The algorithms [`verify`] allows when [`Validation::algorithms`] is unset.
    ///
    /// A secret that holds PEM text is sniffed for its markers: a certificate
    /// or SPKI public key allows every asymmetric algorithm, a PKCS#1 RSA
    /// public key the RSA ones. Anything else is an HMAC secret. This is a
    /// convenience, pin `algorithms` when the key source is not trusted.
    pub fn inferred_algorithms(&self) -> &'static [Algorithm] {
        match self {
            DecodingKey::None => HMAC_ALGORITHMS,
            DecodingKey::OctetSeq(secret) => {
                let text = String::from_utf8_lossy(secret);
                if text.contains("BEGIN CERTIFICATE") || text.contains("BEGIN PUBLIC KEY") {
                    PUBLIC_KEY_ALGORITHMS
                } else if text.contains("BEGIN RSA PUBLIC KEY") {
                    RSA_ALGORITHMS
                } else {
                    HMAC_ALGORITHMS
                }
            }
            DecodingKey::Rsa(_) => RSA_ALGORITHMS,
            DecodingKey::Ec(_) => PUBLIC_KEY_ALGORITHMS,
        }
    }
}

impl fmt::Debug for DecodingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodingKey::None => f.write_str("None"),
            DecodingKey::OctetSeq(_) => f.write_str("OctetSeq(..)"),
            DecodingKey::Rsa(key) => f.debug_tuple("Rsa").field(key).finish(),
            DecodingKey::Ec(key) => f.debug_tuple("Ec").field(key).finish(),
        }
    }
}

/// Options for [`decode`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Require a JSON payload even when the header does not say `typ: JWT`
    pub json: bool,
}

/// Verify a JWT and validate its claims.
///
/// If the token or its signature is invalid or the claims fail validation, it will return an error.
/// The checks run in a fixed order and the first failure is returned.
///
/// ```rust
/// use jwt_rustcrypto::{verify, DecodingKey, Validation, Algorithm};
///
/// let token = "a.jwt.token".to_string();
/// let token_data = verify(&token, &DecodingKey::from_secret("secret".as_ref()), &Validation::new(Algorithm::HS256));
/// assert!(token_data.is_err());
/// ```
pub fn verify(token: &str, key: &DecodingKey, validation: &Validation) -> Result<TokenData> {
    match verify_token(token, key, validation) {
        Ok(data) => {
            trace!(alg = ?data.header.alg, "verified token");
            Ok(data)
        }
        Err(err) => {
            debug!(error = %err, "rejected token");
            Err(err)
        }
    }
}

fn verify_token(token: &str, key: &DecodingKey, validation: &Validation) -> Result<TokenData> {
    validation.check_options()?;

    if token.split('.').count() != 3 {
        return Err(new_error(ErrorKind::Malformed));
    }
    let decoded = decode_compact(token, false).ok_or_else(|| new_error(ErrorKind::InvalidToken))?;

    let has_signature = !decoded.signature_segment.trim().is_empty();
    if !has_signature && !key.is_none() {
        return Err(new_error(ErrorKind::SignatureRequired));
    }
    if has_signature && key.is_none() {
        return Err(new_error(ErrorKind::KeyRequired));
    }

    let allowed: &[Algorithm] = match &validation.algorithms {
        Some(algorithms) => algorithms,
        None if !has_signature => &[Algorithm::None],
        None => key.inferred_algorithms(),
    };
    let alg = match decoded.header.algorithm() {
        Ok(alg) if allowed.contains(&alg) => alg,
        _ => {
            debug!(alg = ?decoded.header.alg, "algorithm not allowed");
            return Err(new_error(ErrorKind::InvalidAlgorithm(None)));
        }
    };

    if !crypto::verify(decoded.signature_segment, &decoded.signing_input(), key, alg)? {
        return Err(new_error(ErrorKind::InvalidSignature));
    }

    validate(&decoded.payload, validation, validation.now())?;

    Ok(TokenData {
        header: decoded.header,
        payload: decoded.payload,
        signature: decoded.signature_segment.to_owned(),
    })
}

/// Decode a JWT without any signature verification/validations.
///
/// NOTE: Do not use this unless you know what you are doing! If the token's signature is invalid, it will *not* return an error.
/// Returns `None` when the token is not structurally a JWS.
///
/// ```rust
/// use jwt_rustcrypto::{decode, DecodeOptions};
///
/// let token = "a.jwt.token".to_string();
/// assert!(decode(&token, &DecodeOptions::default()).is_none());
/// ```
pub fn decode(token: &str, options: &DecodeOptions) -> Option<TokenData> {
    decode_compact(token, options.json).map(|decoded| TokenData {
        header: decoded.header,
        payload: decoded.payload,
        signature: decoded.signature_segment.to_owned(),
    })
}

/// Decode a JWT without any signature verification/validations and return its [Header](struct.Header.html).
///
/// If the first segment is not a header, it will return an `InvalidToken` error.
///
/// ```rust
/// use jwt_rustcrypto::decode_header;
///
/// let token = "a.jwt.token".to_string();
/// let header = decode_header(&token);
/// assert!(header.is_err());
/// ```
pub fn decode_header(token: &str) -> Result<Header> {
    let header = token.split('.').next().unwrap_or_default();
    Header::from_encoded(header).map_err(|_| new_error(ErrorKind::InvalidToken))
}
