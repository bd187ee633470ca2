use rsa::pss::Pss;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::algorithms::ShaWidth;
use crate::errors::Result;
use crate::serialization::{b64_decode, b64_encode};

fn hash(width: ShaWidth, message: &str) -> Vec<u8> {
    match width {
        ShaWidth::Sha256 => Sha256::digest(message.as_bytes()).to_vec(),
        ShaWidth::Sha384 => Sha384::digest(message.as_bytes()).to_vec(),
        ShaWidth::Sha512 => Sha512::digest(message.as_bytes()).to_vec(),
    }
}

fn pkcs1_scheme(width: ShaWidth) -> Pkcs1v15Sign {
    match width {
        ShaWidth::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        ShaWidth::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        ShaWidth::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// PSS with MGF1 over the same digest, salt length equal to the digest length.
fn pss_scheme(width: ShaWidth) -> Pss {
    match width {
        ShaWidth::Sha256 => Pss::new::<Sha256>(),
        ShaWidth::Sha384 => Pss::new::<Sha384>(),
        ShaWidth::Sha512 => Pss::new::<Sha512>(),
    }
}

/// The actual RSA signing + encoding
pub(crate) fn sign_pkcs1(width: ShaWidth, key: &RsaPrivateKey, message: &str) -> Result<String> {
    let signature =
        key.sign_with_rng(&mut rand::thread_rng(), pkcs1_scheme(width), &hash(width, message))?;
    Ok(b64_encode(&signature))
}

pub(crate) fn sign_pss(width: ShaWidth, key: &RsaPrivateKey, message: &str) -> Result<String> {
    let signature =
        key.sign_with_rng(&mut rand::thread_rng(), pss_scheme(width), &hash(width, message))?;
    Ok(b64_encode(&signature))
}

/// Checks that a PKCS#1 v1.5 signature is valid for the public key
pub(crate) fn verify_pkcs1(
    width: ShaWidth,
    signature: &str,
    message: &str,
    key: &RsaPublicKey,
) -> bool {
    match b64_decode(signature) {
        Ok(signature_bytes) => {
            key.verify(pkcs1_scheme(width), &hash(width, message), &signature_bytes).is_ok()
        }
        Err(_) => false,
    }
}

pub(crate) fn verify_pss(width: ShaWidth, signature: &str, message: &str, key: &RsaPublicKey) -> bool {
    match b64_decode(signature) {
        Ok(signature_bytes) => {
            key.verify(pss_scheme(width), &hash(width, message), &signature_bytes).is_ok()
        }
        Err(_) => false,
    }
}
