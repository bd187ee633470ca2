use jwt_rustcrypto::{
    decode, errors::ErrorKind, sign, verify, Algorithm, Audience, AudienceMatcher, DecodeOptions,
    DecodingKey, EncodingKey, Payload, SignOptions, Timespan, Validation,
};
use serde_json::{json, Value};

const NOW: i64 = 1_700_000_000;
const SECRET: &[u8] = b"secret";

fn token_for(claims: Value) -> String {
    token_with(claims, &SignOptions::new(Algorithm::HS256))
}

fn token_with(claims: Value, options: &SignOptions) -> String {
    let payload = Payload::from_claims(&claims).unwrap();
    sign(&payload, &EncodingKey::from_secret(SECRET), options).unwrap()
}

fn validation() -> Validation {
    Validation { clock_timestamp: Some(NOW), ..Validation::new(Algorithm::HS256) }
}

fn check(token: &str, validation: &Validation) -> Result<Payload, ErrorKind> {
    verify(token, &DecodingKey::from_secret(SECRET), validation)
        .map(|data| data.payload)
        .map_err(|err| err.into_kind())
}

#[test]
fn round_trip_adds_only_iat() {
    let payload = json!({"sub": "b@b.com", "company": "ACME", "iat": NOW});
    let decoded = check(&token_for(payload.clone()), &validation()).unwrap();
    assert_eq!(decoded, Payload::from_claims(&payload).unwrap());

    let fresh = check(&token_for(json!({"a": 1})), &Validation::new(Algorithm::HS256)).unwrap();
    assert!(fresh.claim("iat").and_then(Value::as_i64).is_some());
}

#[test]
fn expiry() {
    let expired = token_for(json!({"iat": NOW - 20, "exp": NOW - 10}));
    assert!(matches!(check(&expired, &validation()), Err(ErrorKind::Expired { expired_at }) if expired_at == NOW - 10));

    let live = token_for(json!({"iat": NOW - 20, "exp": NOW + 10}));
    assert!(check(&live, &validation()).is_ok());

    let tolerant = Validation { clock_tolerance: 11, ..validation() };
    assert!(check(&expired, &tolerant).is_ok());

    let ignoring = Validation { ignore_expiration: true, ..validation() };
    assert!(check(&expired, &ignoring).is_ok());
}

#[test]
fn not_before() {
    let early = token_for(json!({"iat": NOW, "nbf": NOW + 10}));
    assert!(matches!(check(&early, &validation()), Err(ErrorKind::NotYetActive { active_at }) if active_at == NOW + 10));
    assert!(check(&token_for(json!({"iat": NOW, "nbf": NOW - 10})), &validation()).is_ok());

    let ignoring = Validation { ignore_not_before: true, ..validation() };
    assert!(check(&early, &ignoring).is_ok());
}

#[test]
fn expires_in_and_not_before_options() {
    let options = SignOptions {
        expires_in: Some("1h".into()),
        not_before: Some(Timespan::Seconds(60)),
        ..SignOptions::new(Algorithm::HS256)
    };
    let token = token_with(json!({"iat": NOW}), &options);
    let payload = decode(&token, &DecodeOptions::default()).unwrap().payload;
    assert_eq!(payload.claim("exp"), Some(&json!(NOW + 3600)));
    assert_eq!(payload.claim("nbf"), Some(&json!(NOW + 60)));

    assert!(matches!(check(&token, &validation()), Err(ErrorKind::NotYetActive { .. })));
    let later = Validation { clock_timestamp: Some(NOW + 120), ..validation() };
    assert!(check(&token, &later).is_ok());
    let much_later = Validation { clock_timestamp: Some(NOW + 3600), ..validation() };
    assert!(matches!(check(&token, &much_later), Err(ErrorKind::Expired { .. })));
}

#[test]
fn audience_patterns() {
    let token = token_for(json!({"iat": NOW, "aud": ["foo", "bar1"]}));
    let matching = Validation {
        audience: Some(vec!["foo".into(), AudienceMatcher::pattern(r"^bar\d$").unwrap()]),
        ..validation()
    };
    assert!(check(&token, &matching).is_ok());

    let pattern_only = Validation { audience: Some(vec![AudienceMatcher::pattern(r"^bar\d$").unwrap()]), ..validation() };
    assert!(check(&token, &pattern_only).is_ok());

    let mut other = validation();
    other.set_audience(&["baz"]);
    assert!(matches!(check(&token, &other), Err(ErrorKind::InvalidAudience { .. })));
}

#[test]
fn identity_claims_from_options() {
    let options = SignOptions {
        audience: Some(Audience::from("api")),
        issuer: Some("auth".into()),
        subject: Some("user-1".into()),
        jwtid: Some("id-1".into()),
        ..SignOptions::new(Algorithm::HS256)
    };
    let token = token_with(json!({"iat": NOW, "nonce": "n-1"}), &options);

    let mut strict = Validation {
        subject: Some("user-1".into()),
        jwtid: Some("id-1".into()),
        nonce: Some("n-1".into()),
        ..validation()
    };
    strict.set_audience(&["api"]);
    strict.set_issuer(&["other", "auth"]);
    assert!(check(&token, &strict).is_ok());

    let mut wrong_issuer = strict.clone();
    wrong_issuer.set_issuer(&["other"]);
    assert!(matches!(check(&token, &wrong_issuer), Err(ErrorKind::InvalidIssuer { expected }) if expected == vec!["other"]));

    let wrong_subject = Validation { subject: Some("user-2".into()), ..strict.clone() };
    assert!(matches!(check(&token, &wrong_subject), Err(ErrorKind::InvalidSubject { .. })));

    let wrong_nonce = Validation { nonce: Some("n-2".into()), ..strict };
    assert!(matches!(check(&token, &wrong_nonce), Err(ErrorKind::InvalidNonce { .. })));
}

#[test]
fn empty_issuer_lists_reject() {
    let token = token_for(json!({"iat": NOW, "iss": "attacker"}));
    let nobody = Validation { issuer: Some(vec![]), ..validation() };
    assert!(matches!(check(&token, &nobody), Err(ErrorKind::InvalidIssuer { .. })));

    let mut blank = validation();
    blank.set_issuer(&[""]);
    assert!(matches!(check(&token, &blank), Err(ErrorKind::InvalidIssuer { .. })));
}

#[test]
fn first_failure_wins() {
    // expired, wrong audience and wrong subject: exp is checked first
    let token = token_for(json!({"iat": NOW - 20, "exp": NOW - 10, "aud": "x", "sub": "y"}));
    let mut validation = Validation { subject: Some("z".into()), ..validation() };
    validation.set_audience(&["a"]);
    assert!(matches!(check(&token, &validation), Err(ErrorKind::Expired { .. })));

    // a bad signature is reported before any claim
    let tampered = format!("{}x", token);
    assert!(matches!(check(&tampered, &validation), Err(ErrorKind::InvalidSignature)));
}

#[test]
fn max_age() {
    let token = token_for(json!({"iat": NOW - 10}));
    let short = Validation { max_age: Some(Timespan::Seconds(5)), ..validation() };
    assert!(matches!(check(&token, &short), Err(ErrorKind::MaxAgeExceeded { limit }) if limit == NOW - 5));
    let long = Validation { max_age: Some(Timespan::Seconds(20)), ..validation() };
    assert!(check(&token, &long).is_ok());

    let without_iat = token_with(json!({"a": 1}), &SignOptions { no_timestamp: true, ..Default::default() });
    assert!(matches!(check(&without_iat, &long), Err(ErrorKind::MissingIat)));
}

#[test]
fn decode_ignores_the_signature() {
    let token = token_for(json!({"iat": NOW, "company": "ACME"}));
    let (message, _) = token.rsplit_once('.').unwrap();
    let forged = format!("{}.AAAA", message);

    let real = decode(&token, &DecodeOptions::default()).unwrap();
    let fake = decode(&forged, &DecodeOptions::default()).unwrap();
    assert_eq!(real.header, fake.header);
    assert_eq!(real.payload, fake.payload);
    assert_eq!(fake.signature, "AAAA");
    assert_eq!(decode(&token, &DecodeOptions::default()), Some(real));
}

#[test]
fn malformed_tokens() {
    let key = DecodingKey::from_secret(SECRET);
    let kind = |token: &str| verify(token, &key, &validation()).unwrap_err().into_kind();
    assert!(matches!(kind(""), ErrorKind::Malformed));
    assert!(matches!(kind("a.b.c.d"), ErrorKind::Malformed));
    assert!(matches!(kind("a.b"), ErrorKind::Malformed));
    assert!(matches!(kind("a.b.c"), ErrorKind::InvalidToken));
    // header is "not json"
    assert!(matches!(kind("bm90IGpzb24.eyJhIjoxfQ.c2ln"), ErrorKind::InvalidToken));
    assert!(decode("a.b.c", &DecodeOptions::default()).is_none());
}

#[test]
fn raw_payloads() {
    let options = SignOptions {
        header: Some(json!({"typ": null}).as_object().unwrap().clone()),
        ..SignOptions::new(Algorithm::HS256)
    };
    let token = sign(&Payload::from("hello"), &EncodingKey::from_secret(SECRET), &options).unwrap();
    assert_eq!(check(&token, &validation()).ok(), Some(Payload::from("hello")));
    assert!(decode(&token, &DecodeOptions { json: true }).is_none());

    // a JWT header promises JSON
    let jwt = sign(&Payload::from("hello"), &EncodingKey::from_secret(SECRET), &SignOptions::default()).unwrap();
    assert!(matches!(check(&jwt, &validation()), Err(ErrorKind::InvalidToken)));
}

#[test]
fn sign_option_conflicts() {
    let key = EncodingKey::from_secret(SECRET);
    let payload = Payload::from_claims(&json!({"iss": "me", "nbf": 1})).unwrap();

    let err = sign(&payload, &key, &SignOptions { issuer: Some("you".into()), ..Default::default() }).unwrap_err();
    assert_eq!(err.to_string(), "Bad \"options.issuer\" option. The payload already has an \"iss\" property.");
    let err = sign(&payload, &key, &SignOptions { not_before: Some(Timespan::Seconds(1)), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ConflictingClaim { option: "notBefore", claim: "nbf" }));
}

#[test]
fn sign_options_from_json() {
    let options: SignOptions = serde_json::from_value(json!({
        "algorithm": "HS384",
        "keyid": "k",
        "expiresIn": 60,
        "audience": "api",
        "header": {"cty": "example"},
    }))
    .unwrap();
    let token = token_with(json!({"iat": NOW}), &options);
    let data = decode(&token, &DecodeOptions::default()).unwrap();
    assert_eq!(data.header.alg.as_deref(), Some("HS384"));
    assert_eq!(data.header.kid.as_deref(), Some("k"));
    assert_eq!(data.header.cty.as_deref(), Some("example"));
    assert_eq!(data.payload.claim("aud"), Some(&json!("api")));
    assert_eq!(data.payload.claim("exp"), Some(&json!(NOW + 60)));

    let unknown = serde_json::from_value::<SignOptions>(json!({"expiresIn": 60, "expires": 60}));
    assert!(unknown.is_err());
}
