#![doc = include_str!("../README.md")]
// #![deny(missing_docs)]

mod algorithms;
/// Lower level functions, if you want to do something other than JWTs
pub mod crypto;
mod decoding;
mod encoding;
/// All the errors that can be encountered while encoding/decoding JWTs
pub mod errors;
mod headers;
mod payload;
/// The compact `header.payload.signature` codec
pub mod serialization;
mod timespan;
mod validation;

pub use algorithms::{
    Algorithm, AlgorithmFamily, ShaWidth, HMAC_ALGORITHMS, PUBLIC_KEY_ALGORITHMS, RSA_ALGORITHMS,
};
pub use crypto::ecdsa::{EcSigningKey, EcVerifyingKey};
pub use decoding::{decode, decode_header, verify, DecodeOptions, DecodingKey, TokenData};
pub use encoding::{encode, sign, Audience, EncodingKey, SignOptions};
pub use headers::Header;
pub use payload::Payload;
pub use timespan::Timespan;
pub use validation::{AudienceMatcher, Validation};
