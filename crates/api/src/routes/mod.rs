//! API route definitions.

use axum::{Router, middleware};
use koperasi_core::CoreError;
use koperasi_core::savings::SavingsType;
use koperasi_shared::types::MemberNumber;

use crate::{AppState, middleware::auth_middleware};

pub mod health;
pub mod loans;
pub mod members;
pub mod savings;
pub mod staff;
pub mod sweep;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require a staff identity
    let protected_routes = Router::new()
        .merge(members::routes())
        .merge(savings::routes())
        .merge(loans::routes())
        .merge(sweep::routes())
        .merge(staff::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

// ============================================================================
// Path parsing
// ============================================================================

/// Parses a member number taken from the path.
fn member_number(raw: &str) -> Result<MemberNumber, CoreError> {
    MemberNumber::parse(raw).ok_or(CoreError::MissingField("member number"))
}

/// Parses a savings type (`pokok`, `wajib`, `sukarela`) taken from the path.
fn savings_type(raw: &str) -> Result<SavingsType, CoreError> {
    SavingsType::parse(raw)
        .ok_or_else(|| CoreError::InvalidInput(format!("unknown savings type: {raw}")))
}
