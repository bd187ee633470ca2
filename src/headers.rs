use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{new_error, ErrorKind, Result};
use crate::serialization::b64_decode;
use crate::Algorithm;

/// A JOSE header.
///
/// Only `alg` and `typ` carry meaning for this crate. The registered
/// parameters below are filled in when they have the registered type, any
/// other parameter (or a registered one with an unexpected type) lands in
/// `extra` untouched. `alg` is kept as the raw string so that an unknown
/// or missing name is rejected by the allow-list rather than by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Header {
    /// # Algorithm
    /// The specific [`Algorithm`] used to sign the object.
    /// Spec: RFC7515, Section 4.1.1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// # Type
    /// Spec: RFC7515, Section 4.1.9
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// # Content Type
    /// Spec: RFC7515, Section 4.1.10
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    /// # Key ID
    /// Spec: RFC7515, Section 4.1.4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// # Critical
    /// Spec: RFC7515, Section 4.1.11
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crit: Option<Vec<String>>,
    /// # JSON Web Key
    /// Spec: RFC7515, Section 4.1.3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Value>,
    /// # X.509 URL
    /// Spec: RFC7515, Section 4.1.5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,
    /// # X.509 Certificate Chain
    /// Spec: RFC7515, Section 4.1.6
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
    /// # X.509 Certificate SHA-1 Thumbprint
    /// Spec: RFC7515, Section 4.1.7
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    /// # X.509 Certificate SHA-256 Thumbprint
    /// Spec: RFC7515, Section 4.1.8
    #[serde(rename = "x5t#S256", skip_serializing_if = "Option::is_none")]
    pub x5t_s256: Option<String>,
    /// Any other header parameter
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Moves `name` out of `fields` if it has the type `T`.
fn take<T: DeserializeOwned>(fields: &mut Map<String, Value>, name: &str) -> Option<T> {
    let typed = T::deserialize(fields.get(name)?).ok()?;
    fields.remove(name);
    Some(typed)
}

impl From<Map<String, Value>> for Header {
    fn from(mut fields: Map<String, Value>) -> Self {
        Header {
            alg: take(&mut fields, "alg"),
            typ: take(&mut fields, "typ"),
            cty: take(&mut fields, "cty"),
            kid: take(&mut fields, "kid"),
            crit: take(&mut fields, "crit"),
            jwk: take(&mut fields, "jwk"),
            x5u: take(&mut fields, "x5u"),
            x5c: take(&mut fields, "x5c"),
            x5t: take(&mut fields, "x5t"),
            x5t_s256: take(&mut fields, "x5t#S256"),
            extra: fields,
        }
    }
}

impl Header {
    /// Returns a JWT header with the algorithm given
    pub fn new(algorithm: Algorithm) -> Self {
        Header {
            alg: Some(algorithm.as_str().to_owned()),
            typ: Some("JWT".to_string()),
            cty: None,
            kid: None,
            crit: None,
            jwk: None,
            x5u: None,
            x5c: None,
            x5t: None,
            x5t_s256: None,
            extra: Map::new(),
        }
    }

    /// Parses `alg` into an [`Algorithm`].
    ///
    /// A missing or non-string `alg` fails with `InvalidAlgorithm`.
    pub fn algorithm(&self) -> Result<Algorithm> {
        match &self.alg {
            Some(alg) => alg.parse(),
            None => Err(new_error(ErrorKind::InvalidAlgorithm(None))),
        }
    }

    /// Whether this header announces a JWT, ie. a JSON claims payload.
    pub fn is_jwt(&self) -> bool {
        self.typ.as_deref() == Some("JWT")
    }

    /// Returns a copy of this header with `overrides` laid over it, key by key.
    pub fn merged_with(&self, overrides: &Map<String, Value>) -> Result<Self> {
        let mut fields = match serde_json::to_value(self)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        for (name, value) in overrides {
            fields.insert(name.clone(), value.clone());
        }
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Converts an encoded part into the Header struct if possible
    pub(crate) fn from_encoded(encoded_part: &str) -> Result<Self> {
        let decoded = b64_decode(encoded_part)?;
        let s = String::from_utf8(decoded)?;

        Ok(serde_json::from_str(&s)?)
    }
}

impl Default for Header {
    /// Returns a JWT header using the default Algorithm, HS256
    fn default() -> Self {
        Header::new(Algorithm::default())
    }
}
