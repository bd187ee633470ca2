use std::error::Error as StdError;
use std::fmt;
use std::string::FromUtf8Error;
use std::sync::Arc;

/// A crate private constructor for `Error`.
pub(crate) fn new_error(kind: ErrorKind) -> Error {
    Error(Box::new(kind))
}

/// A type alias for `Result<T, jwt_rustcrypto::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur when issuing, verifying or decoding a token.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

/// The specific type of an error.
///
/// This enum may grow additional variants, the `#[non_exhaustive]`
/// attribute makes sure clients don't count on exhaustive matching.
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// The token is not three dot separated segments
    Malformed,
    /// The token has three segments but they do not decode to a header and payload
    InvalidToken,
    /// The algorithm is unsupported, not allowed, or does not fit the key.
    ///
    /// Carries the rejected name when a string did not name a supported algorithm.
    InvalidAlgorithm(Option<String>),
    /// A signing key is needed for any algorithm other than `none`
    MissingKey,
    /// The token is signed but no verification key was supplied
    KeyRequired,
    /// A verification key was supplied but the token is unsigned
    SignatureRequired,
    /// The signature does not match
    InvalidSignature,
    /// The key material could not be parsed or used
    InvalidKeyFormat,

    /// `nbf` is still in the future
    NotYetActive {
        /// The `nbf` claim, in seconds since the epoch
        active_at: i64,
    },
    /// `exp` is in the past
    Expired {
        /// The `exp` claim, in seconds since the epoch
        expired_at: i64,
    },
    /// `iat + maxAge` is in the past
    MaxAgeExceeded {
        /// The computed limit, in seconds since the epoch
        limit: i64,
    },
    /// `maxAge` was requested but the token carries no numeric `iat`
    MissingIat,
    /// No audience of the token matches the expected audiences
    InvalidAudience { expected: Vec<String> },
    /// `iss` is not one of the expected issuers
    InvalidIssuer { expected: Vec<String> },
    /// `sub` does not match
    InvalidSubject { expected: String },
    /// `jti` does not match
    InvalidJwtId { expected: String },
    /// `nonce` does not match
    InvalidNonce { expected: String },
    /// A claim is present but has the wrong shape (eg. a non numeric `exp`)
    InvalidClaim(&'static str),

    /// A claim option was given while the payload already has that claim
    ConflictingClaim {
        /// The option name, eg. `expiresIn`
        option: &'static str,
        /// The claim name, eg. `exp`
        claim: &'static str,
    },
    /// A timespan option could not be resolved
    InvalidTimespan(&'static str),
    /// A caller supplied argument is not usable
    InvalidArgument(String),

    // 3rd party errors
    /// An error happened when decoding some base64 text
    Base64(base64::DecodeError),
    /// An error happened while serializing/deserializing JSON
    Json(Arc<serde_json::Error>),
    /// Some of the text was invalid UTF-8
    Utf8(FromUtf8Error),
    /// Something unspecified went wrong in the RSA primitive
    Rsa(rsa::Error),
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &*self.0 {
            ErrorKind::Base64(err) => Some(err),
            ErrorKind::Json(err) => Some(err.as_ref()),
            ErrorKind::Utf8(err) => Some(err),
            ErrorKind::Rsa(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ErrorKind::Malformed => write!(f, "jwt malformed"),
            ErrorKind::InvalidToken => write!(f, "invalid token"),
            ErrorKind::InvalidAlgorithm(None) => write!(f, "invalid algorithm"),
            ErrorKind::InvalidAlgorithm(Some(name)) => {
                let supported: Vec<&str> =
                    crate::Algorithm::ALL.iter().map(|alg| alg.as_str()).collect();
                write!(
                    f,
                    "\"{}\" is not a supported algorithm, expected one of: {}",
                    name,
                    supported.join(", ")
                )
            }
            ErrorKind::MissingKey => write!(f, "secret or private key must have a value"),
            ErrorKind::KeyRequired => write!(f, "secret or public key must be provided"),
            ErrorKind::SignatureRequired => write!(f, "jwt signature is required"),
            ErrorKind::InvalidSignature => write!(f, "invalid signature"),
            ErrorKind::InvalidKeyFormat => write!(f, "invalid key format"),
            ErrorKind::NotYetActive { active_at } => write!(f, "jwt not active (nbf {})", active_at),
            ErrorKind::Expired { expired_at } => write!(f, "jwt expired (exp {})", expired_at),
            ErrorKind::MaxAgeExceeded { limit } => write!(f, "maxAge exceeded (limit {})", limit),
            ErrorKind::MissingIat => write!(f, "iat required when maxAge is specified"),
            ErrorKind::InvalidAudience { expected } => {
                write!(f, "jwt audience invalid. expected: {}", expected.join(" or "))
            }
            ErrorKind::InvalidIssuer { expected } => {
                write!(f, "jwt issuer invalid. expected: {}", expected.join(","))
            }
            ErrorKind::InvalidSubject { expected } => {
                write!(f, "jwt subject invalid. expected: {}", expected)
            }
            ErrorKind::InvalidJwtId { expected } => {
                write!(f, "jwt jwtid invalid. expected: {}", expected)
            }
            ErrorKind::InvalidNonce { expected } => {
                write!(f, "jwt nonce invalid. expected: {}", expected)
            }
            ErrorKind::InvalidClaim(claim) => write!(f, "invalid {} value", claim),
            ErrorKind::ConflictingClaim { option, claim } => write!(
                f,
                "Bad \"options.{}\" option. The payload already has an \"{}\" property.",
                option, claim
            ),
            ErrorKind::InvalidTimespan(option) => write!(
                f,
                "\"{}\" should be a number of seconds or string representing a timespan eg: \"1d\", \"20h\", 60",
                option
            ),
            ErrorKind::InvalidArgument(msg) => write!(f, "{}", msg),
            ErrorKind::Base64(err) => write!(f, "Base64 error: {}", err),
            ErrorKind::Json(err) => write!(f, "JSON error: {}", err),
            ErrorKind::Utf8(err) => write!(f, "UTF-8 error: {}", err),
            ErrorKind::Rsa(err) => write!(f, "RSA error: {}", err),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        new_error(ErrorKind::Base64(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        new_error(ErrorKind::Json(Arc::new(err)))
    }
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        new_error(ErrorKind::Utf8(err))
    }
}

impl From<rsa::Error> for Error {
    fn from(err: rsa::Error) -> Error {
        new_error(ErrorKind::Rsa(err))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        new_error(kind)
    }
}
