use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::algorithms::{Algorithm, AlgorithmFamily, ShaWidth};
use crate::decoding::DecodingKey;
use crate::encoding::EncodingKey;
use crate::errors::{new_error, ErrorKind, Result};
use crate::serialization::b64_encode;

pub mod ecdsa;
pub(crate) mod rsa;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// The raw HMAC tag of `message`.
fn hmac_digest(width: ShaWidth, key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let digest = match width {
        ShaWidth::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(key)
                .map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        ShaWidth::Sha384 => {
            let mut mac = HmacSha384::new_from_slice(key)
                .map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        ShaWidth::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(key)
                .map_err(|_| new_error(ErrorKind::InvalidKeyFormat))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(digest)
}

/// The actual HS signing + encoding
pub(crate) fn sign_hmac(width: ShaWidth, key: &[u8], message: &str) -> Result<String> {
    Ok(b64_encode(&hmac_digest(width, key, message.as_bytes())?))
}

/// Compares two byte strings in time independent of their contents.
///
/// Unequal lengths compare unequal straight away, lengths are not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Take the payload of a JWT, sign it using the algorithm given and return
/// the base64 url safe encoded of the result.
///
/// The key has to belong to the algorithm's family, otherwise this fails
/// with `InvalidAlgorithm`. `none` signs to the empty string.
///
/// If you just want to encode a JWT, use `encode` instead.
pub fn sign(message: &str, key: &EncodingKey, algorithm: Algorithm) -> Result<String> {
    match (algorithm.family(), key) {
        (AlgorithmFamily::None, _) => Ok(String::new()),
        (AlgorithmFamily::Hmac(width), EncodingKey::OctetSeq(secret)) => {
            sign_hmac(width, secret, message)
        }
        (AlgorithmFamily::Rsa(width), EncodingKey::Rsa(k)) => rsa::sign_pkcs1(width, k, message),
        (AlgorithmFamily::RsaPss(width), EncodingKey::Rsa(k)) => rsa::sign_pss(width, k, message),
        (AlgorithmFamily::Ecdsa(width), EncodingKey::Ec(k)) => ecdsa::sign(width, k, message),
        (AlgorithmFamily::Hmac(_), _)
        | (AlgorithmFamily::Rsa(_), _)
        | (AlgorithmFamily::RsaPss(_), _)
        | (AlgorithmFamily::Ecdsa(_), _) => Err(new_error(ErrorKind::InvalidAlgorithm(None))),
    }
}

/// Compares the signature given with a re-computed signature for HMAC or using the public key
/// for RSA/EC.
///
/// If you just want to decode a JWT, use `decode` instead.
///
/// `signature` is the signature part of a jwt (text after the second '.')
///
/// `message` is base64(header) + "." + base64(claims)
///
/// A signature that does not decode counts as a mismatch. A key that does not
/// belong to the algorithm's family fails with `InvalidAlgorithm`.
pub fn verify(
    signature: &str,
    message: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
) -> Result<bool> {
    match (algorithm.family(), key) {
        (AlgorithmFamily::None, _) => Ok(signature.is_empty()),
        (AlgorithmFamily::Hmac(width), DecodingKey::OctetSeq(secret)) => {
            let expected = sign_hmac(width, secret, message)?;
            Ok(constant_time_eq(expected.as_bytes(), signature.as_bytes()))
        }
        (AlgorithmFamily::Rsa(width), DecodingKey::Rsa(k)) => {
            Ok(rsa::verify_pkcs1(width, signature, message, k))
        }
        (AlgorithmFamily::RsaPss(width), DecodingKey::Rsa(k)) => {
            Ok(rsa::verify_pss(width, signature, message, k))
        }
        (AlgorithmFamily::Ecdsa(width), DecodingKey::Ec(k)) => {
            Ok(ecdsa::verify(width, signature, message, k))
        }
        (AlgorithmFamily::Hmac(_), _)
        | (AlgorithmFamily::Rsa(_), _)
        | (AlgorithmFamily::RsaPss(_), _)
        | (AlgorithmFamily::Ecdsa(_), _) => Err(new_error(ErrorKind::InvalidAlgorithm(None))),
    }
}
