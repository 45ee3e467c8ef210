use crate::error::AppError;
use rstest::rstest;

#[rstest]
#[case(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden(String::new()), 403, "FORBIDDEN")]
#[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
#[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
#[case(AppError::State(String::new()), 422, "INVALID_STATE")]
#[case(AppError::InsufficientFunds(String::new()), 422, "INSUFFICIENT_FUNDS")]
#[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
#[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
#[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
fn test_status_and_code(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(error.status_code(), status);
    assert_eq!(error.error_code(), code);
}

#[test]
fn test_only_conflict_is_retryable() {
    assert!(AppError::Conflict("version".into()).is_retryable());
    assert!(!AppError::Validation("term".into()).is_retryable());
    assert!(!AppError::InsufficientFunds("saldo".into()).is_retryable());
    assert!(!AppError::Database("down".into()).is_retryable());
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::Unauthorized("msg".into()).to_string(),
        "Authentication failed: msg"
    );
    assert_eq!(
        AppError::Forbidden("msg".into()).to_string(),
        "Access denied: msg"
    );
    assert_eq!(
        AppError::NotFound("msg".into()).to_string(),
        "Not found: msg"
    );
    assert_eq!(
        AppError::State("msg".into()).to_string(),
        "Invalid state: msg"
    );
    assert_eq!(
        AppError::InsufficientFunds("msg".into()).to_string(),
        "Insufficient funds: msg"
    );
}
