use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::crypto;
use crate::crypto::ecdsa::EcSigningKey;
use crate::errors::{new_error, ErrorKind, Result};
use crate::headers::Header;
use crate::payload::Payload;
use crate::serialization::encode_segments;
use crate::timespan::Timespan;
use crate::validation::now;
use crate::Algorithm;

/// A key to encode a JWT with. Can be nothing, a secret, an RSA private key or an EC private key.
/// This key can be re-used - so make sure you only initialize it once if you can for better performance
#[derive(Clone)]
pub enum EncodingKey {
    None,
    OctetSeq(Vec<u8>),
    Rsa(Box<rsa::RsaPrivateKey>),
    Ec(EcSigningKey),
}

impl EncodingKey {
    pub fn from_none() -> Self {
        EncodingKey::None
    }

    /// If you're using a HMAC secret that is not base64, use that.
    pub fn from_secret(secret: &[u8]) -> Self {
        EncodingKey::OctetSeq(secret.to_vec())
    }

    /// If you have a base64 HMAC secret, use that.
    pub fn from_base64_secret(secret: &str) -> Result<Self> {
        Ok(EncodingKey::OctetSeq(STANDARD.decode(secret)?))
    }

    pub fn from_rsa(key: rsa::RsaPrivateKey) -> Result<Self> {
        Ok(EncodingKey::Rsa(Box::new(key)))
    }

    /// Reads a PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8 (`BEGIN PRIVATE KEY`) PEM.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self> {
        use rsa::pkcs1::DecodeRsaPrivateKey;
        use rsa::pkcs8::DecodePrivateKey;

        let pem = std::str::from_utf8(pem).map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
        let key = if pem.contains("BEGIN RSA PRIVATE KEY") {
            rsa::RsaPrivateKey::from_pkcs1_pem(pem).ok()
        } else {
            rsa::RsaPrivateKey::from_pkcs8_pem(pem).ok()
        };
        key.map(|k| EncodingKey::Rsa(Box::new(k))).ok_or_else(|| new_error(ErrorKind::InvalidKeyFormat))
    }

    pub fn from_ec(key: EcSigningKey) -> Self {
        EncodingKey::Ec(key)
    }

    /// Reads a PKCS#8 or SEC1 PEM on P-256, P-384 or P-521.
    pub fn from_ec_pem(pem: &[u8]) -> Result<Self> {
        let pem = std::str::from_utf8(pem).map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
        Ok(EncodingKey::Ec(EcSigningKey::from_pem(pem)?))
    }

    /// No key at all, or an empty secret
    pub fn is_none(&self) -> bool {
        match self {
            EncodingKey::None => true,
            EncodingKey::OctetSeq(secret) => secret.is_empty(),
            EncodingKey::Rsa(_) | EncodingKey::Ec(_) => false,
        }
    }
}

impl fmt::Debug for EncodingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingKey::None => f.write_str("None"),
            EncodingKey::OctetSeq(_) => f.write_str("OctetSeq(..)"),
            EncodingKey::Rsa(_) => f.write_str("Rsa(..)"),
            EncodingKey::Ec(key) => f.debug_tuple("Ec").field(key).finish(),
        }
    }
}

/// An `aud` value: a single audience or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Audience {
    fn from(audience: &str) -> Self {
        Audience::One(audience.to_owned())
    }
}

impl From<Vec<String>> for Audience {
    fn from(audiences: Vec<String>) -> Self {
        Audience::Many(audiences)
    }
}

impl From<&Audience> for Value {
    fn from(audience: &Audience) -> Self {
        match audience {
            Audience::One(one) => Value::String(one.clone()),
            Audience::Many(many) => Value::Array(many.iter().cloned().map(Value::String).collect()),
        }
    }
}

/// How [`sign`] builds the token.
///
/// Deserializes from the camelCase option names (`expiresIn`, `notBefore`,
/// `noTimestamp`, ...) and rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SignOptions {
    /// Defaults to HS256
    pub algorithm: Option<Algorithm>,
    /// Goes into the header as `kid`
    pub keyid: Option<String>,
    /// Header parameters laid over `{alg, typ, kid}`
    pub header: Option<Map<String, Value>>,
    /// Leave `iat` out of the claims
    pub no_timestamp: bool,
    /// `exp`, relative to `iat`
    pub expires_in: Option<Timespan>,
    /// `nbf`, relative to `iat`
    pub not_before: Option<Timespan>,
    pub audience: Option<Audience>,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub jwtid: Option<String>,
}

impl SignOptions {
    pub fn new(algorithm: Algorithm) -> Self {
        SignOptions { algorithm: Some(algorithm), ..Default::default() }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm.unwrap_or_default()
    }

    /// The claim options that are set, as `(option name, claim name)`.
    fn claim_options(&self) -> Vec<(&'static str, &'static str)> {
        [
            ("expiresIn", "exp", self.expires_in.is_some()),
            ("notBefore", "nbf", self.not_before.is_some()),
            ("audience", "aud", self.audience.is_some()),
            ("issuer", "iss", non_empty(&self.issuer).is_some()),
            ("subject", "sub", non_empty(&self.subject).is_some()),
            ("jwtid", "jti", non_empty(&self.jwtid).is_some()),
        ]
        .into_iter()
        .filter(|(_, _, set)| *set)
        .map(|(option, claim, _)| (option, claim))
        .collect()
    }
}

fn non_empty(option: &Option<String>) -> Option<&str> {
    option.as_deref().filter(|value| !value.is_empty())
}

fn numeric_timestamp(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f.floor() as i64))
}

/// Issues a token: applies the claim options to `payload`, builds the header
/// and signs.
///
/// ```rust
/// use jwt_rustcrypto::{sign, EncodingKey, Payload, SignOptions};
/// use serde_json::json;
///
/// let payload = Payload::from_claims(&json!({"sub": "b@b.com", "company": "ACME"})).unwrap();
/// let options = SignOptions { expires_in: Some("2h".into()), ..Default::default() };
/// let token = sign(&payload, &EncodingKey::from_secret(b"secret"), &options).unwrap();
/// ```
pub fn sign(payload: &Payload, key: &EncodingKey, options: &SignOptions) -> Result<String> {
    let algorithm = options.algorithm();
    if algorithm != Algorithm::None && key.is_none() {
        return Err(new_error(ErrorKind::MissingKey));
    }

    let payload = match payload {
        Payload::Raw(text) => {
            if let Some((option, _)) = options.claim_options().first() {
                return Err(new_error(ErrorKind::InvalidArgument(format!(
                    "invalid {} option for string payload",
                    option
                ))));
            }
            Payload::Raw(text.clone())
        }
        Payload::Claims(claims) => Payload::Claims(apply_claim_options(claims.clone(), options)?),
    };

    let mut header = Header::new(algorithm);
    header.kid = options.keyid.clone();
    if let Some(overrides) = &options.header {
        header = header.merged_with(overrides)?;
    }

    encode(&header, &payload, key)
}

fn apply_claim_options(
    mut claims: Map<String, Value>,
    options: &SignOptions,
) -> Result<Map<String, Value>> {
    for (option, claim) in options.claim_options() {
        if claims.contains_key(claim) {
            return Err(new_error(ErrorKind::ConflictingClaim { option, claim }));
        }
    }

    let timestamp = match claims.get("iat") {
        Some(iat) => numeric_timestamp(iat).ok_or_else(|| new_error(ErrorKind::InvalidClaim("iat")))?,
        None => now(),
    };
    if options.no_timestamp {
        claims.remove("iat");
    } else if !claims.contains_key("iat") {
        claims.insert("iat".to_owned(), Value::Number(Number::from(timestamp)));
    }

    if let Some(not_before) = &options.not_before {
        let nbf = not_before
            .resolve(timestamp)
            .ok_or_else(|| new_error(ErrorKind::InvalidTimespan("notBefore")))?;
        claims.insert("nbf".to_owned(), Value::Number(Number::from(nbf)));
    }
    if let Some(expires_in) = &options.expires_in {
        let exp = expires_in
            .resolve(timestamp)
            .ok_or_else(|| new_error(ErrorKind::InvalidTimespan("expiresIn")))?;
        claims.insert("exp".to_owned(), Value::Number(Number::from(exp)));
    }

    if let Some(audience) = &options.audience {
        claims.insert("aud".to_owned(), Value::from(audience));
    }
    for (claim, value) in [("iss", &options.issuer), ("sub", &options.subject), ("jti", &options.jwtid)] {
        if let Some(value) = non_empty(value) {
            claims.insert(claim.to_owned(), Value::from(value));
        }
    }
    Ok(claims)
}

/// Encode the header and payload given and sign them using the algorithm from the header and the key.
/// No claim is added or checked, see [`sign`] for that.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use jwt_rustcrypto::{encode, Algorithm, Header, EncodingKey, Payload};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Claims {
///    sub: String,
///    company: String
/// }
///
/// let my_claims = Claims {
///     sub: "b@b.com".to_owned(),
///     company: "ACME".to_owned()
/// };
///
/// // This will create a JWT using HS256 as algorithm
/// let payload = Payload::from_claims(&my_claims).unwrap();
/// let token = encode(&Header::new(Algorithm::HS256), &payload, &EncodingKey::from_secret("secret".as_ref())).unwrap();
/// ```
pub fn encode(header: &Header, payload: &Payload, key: &EncodingKey) -> Result<String> {
    let alg = header.algorithm()?;
    let segments = encode_segments(header, payload)?;
    let signature = crypto::sign(&segments.signing_input(), key, alg)?;
    trace!(alg = alg.as_str(), "signed token");
    Ok(segments.into_token(&signature))
}
