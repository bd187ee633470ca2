use std::fmt;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey};

use crate::algorithms::ShaWidth;
use crate::errors::{new_error, ErrorKind, Result};
use crate::serialization::{b64_decode, b64_encode};

/// An ECDSA private key on one of the curves JWS pairs with ES256, ES384 and ES512.
#[derive(Clone)]
pub enum EcSigningKey {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
}

/// An ECDSA public key.
#[derive(Clone)]
pub enum EcVerifyingKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    P521(p521::ecdsa::VerifyingKey),
}

fn key_error<E>(_: E) -> crate::errors::Error {
    new_error(ErrorKind::InvalidKeyFormat)
}

impl EcSigningKey {
    /// Reads a PKCS#8 (`BEGIN PRIVATE KEY`) or SEC1 (`BEGIN EC PRIVATE KEY`) PEM.
    /// The curve is taken from the key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        if pem.contains("BEGIN EC PRIVATE KEY") {
            if let Ok(secret) = p256::SecretKey::from_sec1_pem(pem) {
                return Ok(EcSigningKey::P256(secret.into()));
            }
            if let Ok(secret) = p384::SecretKey::from_sec1_pem(pem) {
                return Ok(EcSigningKey::P384(secret.into()));
            }
            let secret = p521::SecretKey::from_sec1_pem(pem).map_err(key_error)?;
            return Self::p521_from_secret(&secret);
        }

        if let Ok(secret) = p256::SecretKey::from_pkcs8_pem(pem) {
            return Ok(EcSigningKey::P256(secret.into()));
        }
        if let Ok(secret) = p384::SecretKey::from_pkcs8_pem(pem) {
            return Ok(EcSigningKey::P384(secret.into()));
        }
        let secret = p521::SecretKey::from_pkcs8_pem(pem).map_err(key_error)?;
        Self::p521_from_secret(&secret)
    }

    fn p521_from_secret(secret: &p521::SecretKey) -> Result<Self> {
        let key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(key_error)?;
        Ok(EcSigningKey::P521(key))
    }

    /// The matching public key
    pub fn verifying_key(&self) -> EcVerifyingKey {
        match self {
            EcSigningKey::P256(k) => EcVerifyingKey::P256(k.verifying_key().clone()),
            EcSigningKey::P384(k) => EcVerifyingKey::P384(k.verifying_key().clone()),
            EcSigningKey::P521(k) => EcVerifyingKey::P521(p521::ecdsa::VerifyingKey::from(k)),
        }
    }

    pub fn curve(&self) -> &'static str {
        match self {
            EcSigningKey::P256(_) => "P-256",
            EcSigningKey::P384(_) => "P-384",
            EcSigningKey::P521(_) => "P-521",
        }
    }
}

impl EcVerifyingKey {
    /// Reads a `BEGIN PUBLIC KEY` PEM.
    pub fn from_pem(pem: &str) -> Result<Self> {
        if let Ok(public) = p256::PublicKey::from_public_key_pem(pem) {
            return Ok(EcVerifyingKey::P256(public.into()));
        }
        if let Ok(public) = p384::PublicKey::from_public_key_pem(pem) {
            return Ok(EcVerifyingKey::P384(public.into()));
        }
        let public = p521::PublicKey::from_public_key_pem(pem).map_err(key_error)?;
        let key = p521::ecdsa::VerifyingKey::from_affine(*public.as_affine()).map_err(key_error)?;
        Ok(EcVerifyingKey::P521(key))
    }

    pub fn curve(&self) -> &'static str {
        match self {
            EcVerifyingKey::P256(_) => "P-256",
            EcVerifyingKey::P384(_) => "P-384",
            EcVerifyingKey::P521(_) => "P-521",
        }
    }
}

impl fmt::Debug for EcSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EcSigningKey").field(&self.curve()).finish()
    }
}

impl fmt::Debug for EcVerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EcVerifyingKey").field(&self.curve()).finish()
    }
}

/// Bytes per coordinate for the curve an ES algorithm runs on: P-256, P-384 or P-521.
pub fn param_bytes(width: ShaWidth) -> usize {
    match width {
        ShaWidth::Sha256 => 32,
        ShaWidth::Sha384 => 48,
        ShaWidth::Sha512 => 66,
    }
}

/// The actual ECDSA signing + encoding.
///
/// The curve of `key` must be the one `width` names.
pub(crate) fn sign(width: ShaWidth, key: &EcSigningKey, message: &str) -> Result<String> {
    let der = match (width, key) {
        (ShaWidth::Sha256, EcSigningKey::P256(k)) => {
            let signature: p256::ecdsa::Signature = k.try_sign(message.as_bytes()).map_err(key_error)?;
            signature.to_der().as_bytes().to_vec()
        }
        (ShaWidth::Sha384, EcSigningKey::P384(k)) => {
            let signature: p384::ecdsa::Signature = k.try_sign(message.as_bytes()).map_err(key_error)?;
            signature.to_der().as_bytes().to_vec()
        }
        (ShaWidth::Sha512, EcSigningKey::P521(k)) => {
            let signature: p521::ecdsa::Signature = k.try_sign(message.as_bytes()).map_err(key_error)?;
            signature.to_der().as_bytes().to_vec()
        }
        _ => return Err(new_error(ErrorKind::InvalidAlgorithm(None))),
    };
    Ok(b64_encode(&der_to_jose(&der, param_bytes(width))?))
}

/// Checks a JOSE `r || s` signature. Anything that does not decode, or a key
/// on the wrong curve, is a mismatch.
pub(crate) fn verify(width: ShaWidth, signature: &str, message: &str, key: &EcVerifyingKey) -> bool {
    let der = match b64_decode(signature).and_then(|jose| jose_to_der(&jose, param_bytes(width))) {
        Ok(der) => der,
        Err(_) => return false,
    };
    let message = message.as_bytes();
    match (width, key) {
        (ShaWidth::Sha256, EcVerifyingKey::P256(k)) => p256::ecdsa::Signature::from_der(&der)
            .map(|s| k.verify(message, &s).is_ok())
            .unwrap_or(false),
        (ShaWidth::Sha384, EcVerifyingKey::P384(k)) => p384::ecdsa::Signature::from_der(&der)
            .map(|s| k.verify(message, &s).is_ok())
            .unwrap_or(false),
        (ShaWidth::Sha512, EcVerifyingKey::P521(k)) => p521::ecdsa::Signature::from_der(&der)
            .map(|s| k.verify(message, &s).is_ok())
            .unwrap_or(false),
        _ => false,
    }
}

fn signature_error() -> crate::errors::Error {
    new_error(ErrorKind::InvalidSignature)
}

fn read_length(input: &[u8], pos: &mut usize) -> Result<usize> {
    let first = *input.get(*pos).ok_or_else(signature_error)?;
    *pos += 1;
    match first {
        0x00..=0x7f => Ok(first as usize),
        0x81 => {
            let len = *input.get(*pos).ok_or_else(signature_error)?;
            *pos += 1;
            if len < 0x80 {
                return Err(signature_error());
            }
            Ok(len as usize)
        }
        _ => Err(signature_error()),
    }
}

fn read_integer<'a>(input: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    if input.get(*pos) != Some(&0x02) {
        return Err(signature_error());
    }
    *pos += 1;
    let len = read_length(input, pos)?;
    let value = input.get(*pos..*pos + len).ok_or_else(signature_error)?;
    *pos += len;
    if value.is_empty() {
        return Err(signature_error());
    }
    Ok(value)
}

/// Left pads a big-endian integer to `size` bytes, dropping sign padding.
fn fixed_width(value: &[u8], size: usize, out: &mut Vec<u8>) -> Result<()> {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let digits = &value[start..];
    if digits.len() > size {
        return Err(signature_error());
    }
    out.resize(out.len() + size - digits.len(), 0);
    out.extend_from_slice(digits);
    Ok(())
}

/// Converts a DER `SEQUENCE { INTEGER r, INTEGER s }` into the fixed width
/// `r || s` form JWS uses, each half `param_bytes` long.
pub fn der_to_jose(der: &[u8], param_bytes: usize) -> Result<Vec<u8>> {
    let mut pos = 0;
    if der.first() != Some(&0x30) {
        return Err(signature_error());
    }
    pos += 1;
    let seq_len = read_length(der, &mut pos)?;
    if pos + seq_len != der.len() {
        return Err(signature_error());
    }
    let r = read_integer(der, &mut pos)?;
    let s = read_integer(der, &mut pos)?;
    if pos != der.len() {
        return Err(signature_error());
    }

    let mut jose = Vec::with_capacity(param_bytes * 2);
    fixed_width(r, param_bytes, &mut jose)?;
    fixed_width(s, param_bytes, &mut jose)?;
    Ok(jose)
}

fn push_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
    } else {
        out.push(0x81);
        out.push(len as u8);
    }
}

fn push_integer(value: &[u8], out: &mut Vec<u8>) {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len() - 1);
    let digits = &value[start..];
    let pad = digits[0] & 0x80 != 0;
    out.push(0x02);
    push_length(digits.len() + usize::from(pad), out);
    if pad {
        out.push(0);
    }
    out.extend_from_slice(digits);
}

/// The inverse of [`der_to_jose`]. `sig` must be exactly `2 * param_bytes` long.
pub fn jose_to_der(sig: &[u8], param_bytes: usize) -> Result<Vec<u8>> {
    if param_bytes == 0 || sig.len() != param_bytes * 2 {
        return Err(signature_error());
    }
    let (r, s) = sig.split_at(param_bytes);

    let mut body = Vec::with_capacity(sig.len() + 6);
    push_integer(r, &mut body);
    push_integer(s, &mut body);

    let mut der = Vec::with_capacity(body.len() + 3);
    der.push(0x30);
    push_length(body.len(), &mut der);
    der.extend_from_slice(&body);
    Ok(der)
}
