//! Unit tests for JWT functionality.

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_minutes: 15,
        leeway_secs: 0,
    })
}

#[test]
fn test_claims_new_sets_correct_fields() {
    let staff_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(1);

    let claims = Claims::new(staff_id, "Siti", "bendahara", expires_at);

    assert_eq!(claims.sub, staff_id);
    assert_eq!(claims.staff_id(), staff_id);
    assert_eq!(claims.name, "Siti");
    assert_eq!(claims.role, "bendahara");
    assert!(claims.iat <= Utc::now().timestamp());
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn test_generate_and_validate_token() {
    let service = create_test_service();
    let staff_id = Uuid::new_v4();

    let token = service
        .generate_access_token(staff_id, "Budi", "ketua")
        .unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.staff_id(), staff_id);
    assert_eq!(claims.name, "Budi");
    assert_eq!(claims.role, "ketua");
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    let result = service.validate_token("invalid.token.here");
    assert!(matches!(result, Err(JwtError::DecodingError(_))));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let issuer = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        ..JwtConfig::default()
    });
    let token = issuer
        .generate_access_token(Uuid::new_v4(), "Ani", "admin")
        .unwrap();

    assert!(create_test_service().validate_token(&token).is_err());
}

#[test]
fn test_expired_token() {
    let expired = Claims::new(
        Uuid::new_v4(),
        "Ani",
        "admin",
        Utc::now() - Duration::hours(2),
    );
    let token = encode(
        &Header::default(),
        &expired,
        &EncodingKey::from_secret(b"test-secret-key-for-testing"),
    )
    .unwrap();

    let result = create_test_service().validate_token(&token);
    assert!(matches!(result, Err(JwtError::Expired)));
}
