use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{new_error, Error, ErrorKind, Result};

// See https://www.iana.org/assignments/jose/jose.xhtml#web-signature-encryption-algorithms
macro_rules! make_values_enum {
    (   $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$item_meta:meta])* $item_name:ident, $value:literal, $docstring:literal, $($spec:literal)?)*
        }
    ) => {

        $(#[$meta])*
        $vis enum $name {
            $(
                #[serde(rename = $value)]
                #[doc = $docstring]
                $(#[doc ="\n"] #[doc ="Spec: "] #[doc = $spec])?
                $(#[$item_meta])*
                $item_name
            ),*
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$item_name),*];

            /// The registered name, as it appears in the `alg` header
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$item_name => $value),*
                }
            }
        }
    }
}

make_values_enum! {
    /// The algorithms supported for signing/verifying JWTs.
    #[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize, Default)]
    pub enum Algorithm {
#[default] HS256,"HS256","HMAC using SHA-256", "RFC7518, Section 3.2"
HS384,"HS384","HMAC using SHA-384", "RFC7518, Section 3.2"
HS512,"HS512","HMAC using SHA-512", "RFC7518, Section 3.2"
RS256,"RS256","RSASSA-PKCS1-v1_5 using SHA-256", "RFC7518, Section 3.3"
RS384,"RS384","RSASSA-PKCS1-v1_5 using SHA-384", "RFC7518, Section 3.3"
RS512,"RS512","RSASSA-PKCS1-v1_5 using SHA-512", "RFC7518, Section 3.3"
PS256,"PS256","RSASSA-PSS using SHA-256 and MGF1 with SHA-256", "RFC7518, Section 3.5"
PS384,"PS384","RSASSA-PSS using SHA-384 and MGF1 with SHA-384", "RFC7518, Section 3.5"
PS512,"PS512","RSASSA-PSS using SHA-512 and MGF1 with SHA-512", "RFC7518, Section 3.5"
ES256,"ES256","ECDSA using P-256 and SHA-256", "RFC7518, Section 3.4"
ES384,"ES384","ECDSA using P-384 and SHA-384", "RFC7518, Section 3.4"
ES512,"ES512","ECDSA using P-521 and SHA-512", "RFC7518, Section 3.4"
None,"none","No digital signature or MAC performed", "RFC7518, Section 3.6"
    }
}

/// The SHA-2 width fixed by the suffix of an algorithm name.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ShaWidth {
    Sha256,
    Sha384,
    Sha512,
}

impl ShaWidth {
    pub fn bits(&self) -> u16 {
        match self {
            ShaWidth::Sha256 => 256,
            ShaWidth::Sha384 => 384,
            ShaWidth::Sha512 => 512,
        }
    }
}

/// The signature scheme behind an [`Algorithm`].
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum AlgorithmFamily {
    Hmac(ShaWidth),
    Rsa(ShaWidth),
    RsaPss(ShaWidth),
    Ecdsa(ShaWidth),
    None,
}

/// Every HMAC algorithm
pub const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Every algorithm an RSA key can verify
pub const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Every asymmetric algorithm
pub const PUBLIC_KEY_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::ES512,
];

impl Algorithm {
    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Algorithm::HS256 => AlgorithmFamily::Hmac(ShaWidth::Sha256),
            Algorithm::HS384 => AlgorithmFamily::Hmac(ShaWidth::Sha384),
            Algorithm::HS512 => AlgorithmFamily::Hmac(ShaWidth::Sha512),
            Algorithm::RS256 => AlgorithmFamily::Rsa(ShaWidth::Sha256),
            Algorithm::RS384 => AlgorithmFamily::Rsa(ShaWidth::Sha384),
            Algorithm::RS512 => AlgorithmFamily::Rsa(ShaWidth::Sha512),
            Algorithm::PS256 => AlgorithmFamily::RsaPss(ShaWidth::Sha256),
            Algorithm::PS384 => AlgorithmFamily::RsaPss(ShaWidth::Sha384),
            Algorithm::PS512 => AlgorithmFamily::RsaPss(ShaWidth::Sha512),
            Algorithm::ES256 => AlgorithmFamily::Ecdsa(ShaWidth::Sha256),
            Algorithm::ES384 => AlgorithmFamily::Ecdsa(ShaWidth::Sha384),
            Algorithm::ES512 => AlgorithmFamily::Ecdsa(ShaWidth::Sha512),
            Algorithm::None => AlgorithmFamily::None,
        }
    }

    /// The digest width, `None` for the `none` algorithm.
    pub fn sha_width(&self) -> Option<ShaWidth> {
        match self.family() {
            AlgorithmFamily::Hmac(width)
            | AlgorithmFamily::Rsa(width)
            | AlgorithmFamily::RsaPss(width)
            | AlgorithmFamily::Ecdsa(width) => Some(width),
            AlgorithmFamily::None => None,
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .iter()
            .find(|alg| alg.as_str() == s)
            .copied()
            .ok_or_else(|| new_error(ErrorKind::InvalidAlgorithm(Some(s.to_owned()))))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
