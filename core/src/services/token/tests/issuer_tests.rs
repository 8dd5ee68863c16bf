//! Tests for access token signing and validation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use uuid::Uuid;

use super::fixed_now;
use crate::domain::entities::ClaimValue;
use crate::errors::{DomainError, TokenError};
use crate::services::clock::ManualClock;
use crate::services::token::{AccessTokenIssuer, ClaimsBuilder, ExtraClaims, TokenServiceConfig};

fn create_test_issuer() -> (AccessTokenIssuer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let issuer = AccessTokenIssuer::new(&TokenServiceConfig::default(), clock.clone())
        .expect("Failed to create issuer");
    (issuer, clock)
}

fn token_error(result: Result<impl std::fmt::Debug, DomainError>) -> TokenError {
    match result {
        Err(DomainError::Token(e)) => e,
        other => panic!("expected token error, got {:?}", other),
    }
}

#[test]
fn test_issue_and_validate() {
    let (issuer, _clock) = create_test_issuer();
    let user_id = Uuid::new_v4();
    let mut extra = ExtraClaims::new();
    extra.insert("depot_id".to_string(), Some(ClaimValue::from(17i64)));
    let built = ClaimsBuilder::new().build(user_id, "ops@shiptrack.test", &["Staff", "Admin"], Some(&extra));

    let issued = issuer.issue(&built.claims, fixed_now()).unwrap();
    assert_eq!(issued.expires_at, fixed_now() + Duration::minutes(15));

    let claims = issuer.validate(&issued.token, false).unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(claims.email, "ops@shiptrack.test");
    assert_eq!(claims.role, vec!["Staff".to_string(), "Admin".to_string()]);
    assert_eq!(claims.jti, issued.jti);
    assert_eq!(claims.iss, "shiptrack");
    assert_eq!(claims.aud, "shiptrack-api");
    assert_eq!(claims.iat, fixed_now().timestamp());
    assert_eq!(claims.nbf, fixed_now().timestamp());
    assert_eq!(claims.exp, (fixed_now() + Duration::minutes(15)).timestamp());
    assert_eq!(claims.extra.get("depot_id").map(String::as_str), Some("17"));
}

#[test]
fn test_unique_jti_per_token() {
    let (issuer, _clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);

    let first = issuer.issue(&built.claims, fixed_now()).unwrap();
    let second = issuer.issue(&built.claims, fixed_now()).unwrap();

    assert_ne!(first.jti, second.jti);
    assert_ne!(first.token, second.token);
}

#[test]
fn test_expired_token() {
    let (issuer, clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);
    let issued = issuer.issue(&built.claims, fixed_now()).unwrap();

    clock.advance(Duration::minutes(15) - Duration::seconds(1));
    assert!(issuer.validate(&issued.token, false).is_ok());

    clock.advance(Duration::seconds(1));
    assert_eq!(token_error(issuer.validate(&issued.token, false)), TokenError::Expired);

    // Principal extraction still works on an expired token
    let claims = issuer.validate(&issued.token, true).unwrap();
    assert_eq!(claims.user_id().unwrap(), built.claims.user_id());
}

#[test]
fn test_not_yet_valid_token() {
    let (issuer, _clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);
    let issued = issuer.issue(&built.claims, fixed_now() + Duration::hours(1)).unwrap();

    assert_eq!(
        token_error(issuer.validate(&issued.token, false)),
        TokenError::TokenNotYetValid
    );
}

#[test]
fn test_wrong_secret_rejected() {
    let (issuer, clock) = create_test_issuer();
    let mut other_config = TokenServiceConfig::default();
    other_config.jwt_secret = "another-secret-that-is-long-enough-for-hs256".to_string();
    let other = AccessTokenIssuer::new(&other_config, clock).unwrap();

    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);
    let issued = other.issue(&built.claims, fixed_now()).unwrap();

    assert_eq!(
        token_error(issuer.validate(&issued.token, false)),
        TokenError::InvalidSignature
    );
}

#[test]
fn test_tampered_payload_rejected() {
    let (issuer, _clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);
    let issued = issuer.issue(&built.claims, fixed_now()).unwrap();

    let parts: Vec<&str> = issued.token.split('.').collect();
    let mut payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    payload["role"] = serde_json::json!(["Admin"]);
    let forged = format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap()),
        parts[2]
    );

    assert_eq!(token_error(issuer.validate(&forged, false)), TokenError::InvalidSignature);
}

#[test]
fn test_unsigned_token_rejected() {
    let (issuer, _clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Admin"], None);
    let issued = issuer.issue(&built.claims, fixed_now()).unwrap();
    let payload = issued.token.split('.').nth(1).unwrap().to_string();

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let unsigned = format!("{}.{}.", header, payload);

    assert!(matches!(issuer.validate(&unsigned, false), Err(DomainError::Token(_))));
}

#[test]
fn test_other_hmac_algorithm_rejected() {
    let (issuer, _clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);
    let issued = issuer.issue(&built.claims, fixed_now()).unwrap();
    let claims = issuer.validate(&issued.token, false).unwrap();

    let secret = TokenServiceConfig::default().jwt_secret;
    let hs512 = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    assert_eq!(token_error(issuer.validate(&hs512, false)), TokenError::InvalidSignature);
}

#[test]
fn test_wrong_issuer_or_audience_rejected() {
    let (issuer, clock) = create_test_issuer();
    let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &["Staff"], None);

    let mut foreign_issuer = TokenServiceConfig::default();
    foreign_issuer.issuer = "someone-else".to_string();
    let foreign = AccessTokenIssuer::new(&foreign_issuer, clock.clone()).unwrap();
    let issued = foreign.issue(&built.claims, fixed_now()).unwrap();
    assert_eq!(token_error(issuer.validate(&issued.token, false)), TokenError::InvalidClaims);

    let mut foreign_audience = TokenServiceConfig::default();
    foreign_audience.audience = "billing-api".to_string();
    let foreign = AccessTokenIssuer::new(&foreign_audience, clock).unwrap();
    let issued = foreign.issue(&built.claims, fixed_now()).unwrap();
    assert_eq!(token_error(issuer.validate(&issued.token, false)), TokenError::InvalidClaims);
}

#[test]
fn test_malformed_token() {
    let (issuer, _clock) = create_test_issuer();
    assert_eq!(
        token_error(issuer.validate("not-a-token", false)),
        TokenError::InvalidTokenFormat
    );
    assert!(issuer.validate("", true).is_err());
}

#[test]
fn test_short_secret_refused() {
    let mut config = TokenServiceConfig::default();
    config.jwt_secret = "too-short".to_string();

    let result = AccessTokenIssuer::new(&config, Arc::new(ManualClock::new(fixed_now())));
    assert!(matches!(result, Err(DomainError::Validation { .. })));
}

#[test]
fn test_out_of_range_lifetimes_refused() {
    let clock = Arc::new(ManualClock::new(fixed_now()));

    let mut config = TokenServiceConfig::default();
    config.access_token_expiry_minutes = 100_000;
    let result = AccessTokenIssuer::new(&config, clock.clone());
    assert!(matches!(result, Err(DomainError::Validation { .. })));

    let mut config = TokenServiceConfig::default();
    config.refresh_token_expiry_days = 365;
    assert!(matches!(config.validate(), Err(DomainError::Validation { .. })));

    let mut config = TokenServiceConfig::default();
    config.refresh_token_expiry_days = i64::MAX / 2;
    assert!(matches!(config.validate(), Err(DomainError::Validation { .. })));

    let mut config = TokenServiceConfig::default();
    config.access_token_expiry_minutes = 1440;
    config.refresh_token_expiry_days = 30;
    assert!(AccessTokenIssuer::new(&config, clock).is_ok());
}
