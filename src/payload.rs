use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{new_error, ErrorKind, Result};

/// The secured content of a token.
///
/// A JWT carries a claims object. Anything else that was signed is kept as
/// the decoded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Claims(Map<String, Value>),
    Raw(String),
}

impl Payload {
    /// Serializes `claims` into a claims payload. `claims` must serialize to a JSON object.
    pub fn from_claims<T: Serialize>(claims: &T) -> Result<Self> {
        match serde_json::to_value(claims)? {
            Value::Object(map) => Ok(Payload::Claims(map)),
            _ => Err(new_error(ErrorKind::InvalidArgument(
                "payload claims must serialize to a JSON object".to_string(),
            ))),
        }
    }

    /// The claims object, if this is a claims payload
    pub fn claims(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Claims(map) => Some(map),
            Payload::Raw(_) => None,
        }
    }

    /// A single claim
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims().and_then(|map| map.get(name))
    }

    /// Deserializes the claims into `T`.
    pub fn deserialize_claims<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Payload::Claims(map) => Ok(serde_json::from_value(Value::Object(map.clone()))?),
            Payload::Raw(text) => Ok(serde_json::from_str(text)?),
        }
    }

    /// The bytes that get base64url encoded into the payload segment.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Claims(map) => Ok(serde_json::to_vec(map)?),
            Payload::Raw(text) => Ok(text.as_bytes().to_vec()),
        }
    }

    /// Reads the payload segment text.
    ///
    /// With `json` set the text must be JSON. Otherwise parsing is
    /// opportunistic and falls back to the raw text. Only an object becomes
    /// [`Payload::Claims`].
    pub(crate) fn from_text(text: String, json: bool) -> Option<Self> {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Some(Payload::Claims(map)),
            Ok(_) => Some(Payload::Raw(text)),
            Err(_) if json => None,
            Err(_) => Some(Payload::Raw(text)),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Claims(Map::new())
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Claims(map)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Raw(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Raw(text.to_owned())
    }
}
