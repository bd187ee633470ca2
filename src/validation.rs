use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::errors::{new_error, ErrorKind, Result};
use crate::payload::Payload;
use crate::timespan::Timespan;
use crate::Algorithm;

/// Seconds since the epoch
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// One accepted audience: an exact string or a pattern.
#[derive(Debug, Clone)]
pub enum AudienceMatcher {
    Exact(String),
    Pattern(Regex),
}

impl AudienceMatcher {
    /// A pattern matcher. Fails on an invalid regular expression.
    pub fn pattern(re: &str) -> Result<Self> {
        Regex::new(re)
            .map(AudienceMatcher::Pattern)
            .map_err(|e| new_error(ErrorKind::InvalidArgument(format!("invalid audience pattern: {}", e))))
    }

    pub fn matches(&self, audience: &str) -> bool {
        match self {
            AudienceMatcher::Exact(expected) => expected == audience,
            AudienceMatcher::Pattern(re) => re.is_match(audience),
        }
    }
}

impl fmt::Display for AudienceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudienceMatcher::Exact(audience) => f.write_str(audience),
            AudienceMatcher::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for AudienceMatcher {
    fn from(audience: &str) -> Self {
        AudienceMatcher::Exact(audience.to_owned())
    }
}

impl From<String> for AudienceMatcher {
    fn from(audience: String) -> Self {
        AudienceMatcher::Exact(audience)
    }
}

impl From<Regex> for AudienceMatcher {
    fn from(re: Regex) -> Self {
        AudienceMatcher::Pattern(re)
    }
}

/// Contains the various validations that are applied after decoding a JWT.
///
/// All time validation happen on UTC timestamps as seconds.
///
/// ```rust
/// use jwt_rustcrypto::{Validation, Algorithm};
///
/// let mut validation = Validation::new(Algorithm::HS256);
/// validation.clock_tolerance = 5;
/// // Setting audience
/// validation.set_audience(&["Me"]); // a single string
/// validation.set_audience(&["Me", "You"]); // array of strings
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Allowed header algorithms.
    ///
    /// `None` infers them from the key (see [`DecodingKey::inferred_algorithms`](crate::DecodingKey::inferred_algorithms)),
    /// an empty list allows nothing.
    pub algorithms: Option<Vec<Algorithm>>,
    /// Use this instead of the wall clock, in seconds since the epoch
    pub clock_timestamp: Option<i64>,
    /// Add some leeway (in seconds) to the `exp`, `nbf` and `maxAge` checks.
    ///
    /// Defaults to `0`.
    pub clock_tolerance: i64,
    /// Skip the `exp` check
    pub ignore_expiration: bool,
    /// Skip the `nbf` check
    pub ignore_not_before: bool,
    /// At least one of the token's audiences has to match one of these.
    pub audience: Option<Vec<AudienceMatcher>>,
    /// `iss` has to be one of these. An empty list accepts no issuer.
    pub issuer: Option<Vec<String>>,
    pub subject: Option<String>,
    pub jwtid: Option<String>,
    /// Must not be blank
    pub nonce: Option<String>,
    /// The longest a token may live after its `iat`.
    pub max_age: Option<Timespan>,
}

impl Validation {
    /// Create a default validation setup allowing the given alg
    pub fn new(alg: Algorithm) -> Validation {
        Validation { algorithms: Some(vec![alg]), ..Validation::default() }
    }

    /// `aud` is a collection of one or more acceptable audience members
    pub fn set_audience<T: ToString>(&mut self, items: &[T]) {
        self.audience = Some(items.iter().map(|x| AudienceMatcher::Exact(x.to_string())).collect())
    }

    /// `iss` is a collection of one or more acceptable issuers
    pub fn set_issuer<T: ToString>(&mut self, items: &[T]) {
        self.issuer = Some(items.iter().map(|x| x.to_string()).collect())
    }

    /// The clock the time based checks run against
    pub fn now(&self) -> i64 {
        self.clock_timestamp.unwrap_or_else(now)
    }

    /// Fails when the options themselves are unusable.
    pub(crate) fn check_options(&self) -> Result<()> {
        if let Some(nonce) = &self.nonce {
            if nonce.trim().is_empty() {
                return Err(new_error(ErrorKind::InvalidArgument(
                    "nonce must be a non-empty string".to_string(),
                )));
            }
        }
        Ok(())
    }
}

fn non_empty(option: &Option<String>) -> Option<&str> {
    option.as_deref().filter(|value| !value.is_empty())
}

/// A claim that has to be a JSON number
fn numeric_claim(payload: &Payload, name: &'static str) -> Result<Option<f64>> {
    match payload.claim(name) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| new_error(ErrorKind::InvalidClaim(name))),
    }
}

fn string_claim<'a>(payload: &'a Payload, name: &str) -> Option<&'a str> {
    payload.claim(name).and_then(Value::as_str)
}

/// Runs the claim checks in order, stopping at the first failure.
pub(crate) fn validate(payload: &Payload, options: &Validation, now: i64) -> Result<()> {
    let tolerance = options.clock_tolerance;

    if !options.ignore_not_before {
        if let Some(nbf) = numeric_claim(payload, "nbf")? {
            if nbf > now.saturating_add(tolerance) as f64 {
                return Err(new_error(ErrorKind::NotYetActive { active_at: nbf as i64 }));
            }
        }
    }

    if !options.ignore_expiration {
        if let Some(exp) = numeric_claim(payload, "exp")? {
            if now as f64 >= exp + tolerance as f64 {
                return Err(new_error(ErrorKind::Expired { expired_at: exp as i64 }));
            }
        }
    }

    if let Some(expected) = &options.audience {
        let audiences: Vec<&str> = match payload.claim("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        let matched = audiences.iter().any(|aud| expected.iter().any(|matcher| matcher.matches(aud)));
        if !matched {
            return Err(new_error(ErrorKind::InvalidAudience {
                expected: expected.iter().map(ToString::to_string).collect(),
            }));
        }
    }

    if let Some(expected) = &options.issuer {
        let iss = string_claim(payload, "iss");
        if !iss.map_or(false, |iss| expected.iter().any(|e| e == iss)) {
            return Err(new_error(ErrorKind::InvalidIssuer { expected: expected.clone() }));
        }
    }

    if let Some(subject) = non_empty(&options.subject) {
        if string_claim(payload, "sub") != Some(subject) {
            return Err(new_error(ErrorKind::InvalidSubject { expected: subject.to_owned() }));
        }
    }

    if let Some(jwtid) = non_empty(&options.jwtid) {
        if string_claim(payload, "jti") != Some(jwtid) {
            return Err(new_error(ErrorKind::InvalidJwtId { expected: jwtid.to_owned() }));
        }
    }

    if let Some(nonce) = &options.nonce {
        if string_claim(payload, "nonce") != Some(nonce.as_str()) {
            return Err(new_error(ErrorKind::InvalidNonce { expected: nonce.clone() }));
        }
    }

    if let Some(max_age) = &options.max_age {
        let iat = payload
            .claim("iat")
            .and_then(Value::as_f64)
            .ok_or_else(|| new_error(ErrorKind::MissingIat))?;
        let limit = max_age
            .resolve(iat.floor() as i64)
            .ok_or_else(|| new_error(ErrorKind::InvalidTimespan("maxAge")))?;
        if now >= limit.saturating_add(tolerance) {
            return Err(new_error(ErrorKind::MaxAgeExceeded { limit }));
        }
    }

    Ok(())
}
