use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::Serialize;

use crate::errors::Result;
use crate::headers::Header;
use crate::payload::Payload;

// Encoding never pads. Decoding accepts padded input and non-canonical trailing bits.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub(crate) fn b64_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn b64_decode(input: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT.decode(input).map_err(|e| e.into())
}

/// Serializes a struct to JSON and encodes it in base64
pub(crate) fn b64_encode_part<T: Serialize>(input: &T) -> Result<String> {
    let json = serde_json::to_vec(input)?;
    Ok(b64_encode(&json))
}

fn is_base64url(segment: &str) -> bool {
    segment.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// The two encoded segments covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSegments {
    pub header: String,
    pub payload: String,
}

impl EncodedSegments {
    /// `header + "." + payload`, the bytes the signature is computed over
    pub fn signing_input(&self) -> String {
        [self.header.as_str(), self.payload.as_str()].join(".")
    }

    /// Appends the signature segment, giving the compact token.
    pub fn into_token(self, signature: &str) -> String {
        [self.header, self.payload, signature.to_owned()].join(".")
    }
}

/// Encodes the header as JSON and the payload as JSON (claims) or as-is (raw text).
pub fn encode_segments(header: &Header, payload: &Payload) -> Result<EncodedSegments> {
    Ok(EncodedSegments { header: b64_encode_part(header)?, payload: b64_encode(&payload.to_bytes()?) })
}

/// A parsed compact token.
///
/// The raw segments are kept: the signature is checked against them, never
/// against a re-encoding of `header` and `payload`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactToken<'a> {
    pub header: Header,
    pub payload: Payload,
    pub header_segment: &'a str,
    pub payload_segment: &'a str,
    pub signature_segment: &'a str,
}

impl CompactToken<'_> {
    pub fn signing_input(&self) -> String {
        [self.header_segment, self.payload_segment].join(".")
    }
}

/// Structural decode of `header.payload.signature`.
///
/// Returns `None` unless there are exactly three base64url segments, the
/// first two non-empty, and the header decodes to a JSON object. The header
/// is not otherwise checked. The payload is JSON-parsed when the header says
/// `typ: JWT` or `json` is set, otherwise opportunistically.
pub fn decode_compact(token: &str, json: bool) -> Option<CompactToken<'_>> {
    let mut parts = token.split('.');
    let (header_segment, payload_segment, signature_segment) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => (header, payload, signature),
            _ => return None,
        };

    if header_segment.is_empty() || payload_segment.is_empty() {
        return None;
    }
    if ![header_segment, payload_segment, signature_segment].iter().all(|s| is_base64url(s)) {
        return None;
    }

    let header = Header::from_encoded(header_segment).ok()?;
    let payload_text = String::from_utf8(b64_decode(payload_segment).ok()?).ok()?;
    let payload = Payload::from_text(payload_text, json || header.is_jwt())?;

    Some(CompactToken { header, payload, header_segment, payload_segment, signature_segment })
}
