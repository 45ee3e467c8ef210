//! Authentication middleware for protected routes.
//!
//! Tokens are issued by the cooperative's identity provider. This service
//! only checks the HS256 signature and expiry, then turns the `sub` and
//! `role` claims into the [`Actor`] every repository call is made as.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use koperasi_core::Actor;
use koperasi_shared::types::StaffId;
use koperasi_shared::{AppError, Claims, JwtError};
use tracing::debug;

use crate::AppState;
use crate::error::{app_error_response, error_response};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Resolves the role claim into an [`Actor`]
/// 4. Stores the actor and claims in request extensions for handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return app_error_response(&AppError::Unauthorized(
            "Authorization header with Bearer token is required".to_string(),
        ));
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => {
            return app_error_response(&AppError::Unauthorized("Token has expired".to_string()));
        }
        Err(e) => {
            debug!(error = %e, "rejected bearer token");
            return app_error_response(&AppError::Unauthorized(
                "Invalid or malformed token".to_string(),
            ));
        }
    };

    let actor = match Actor::from_claims(StaffId::from_uuid(claims.staff_id()), &claims.role) {
        Ok(actor) => actor,
        Err(e) => return error_response(&e),
    };

    request.extensions_mut().insert(actor);
    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Extractor for the authenticated staff member.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     repo.create(&auth.actor, &input).await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity used for permission checks and as the administering staff.
    pub actor: Actor,
    /// The validated token claims.
    pub claims: Claims,
}

impl AuthUser {
    /// Returns the staff ID from the claims.
    #[must_use]
    pub const fn staff_id(&self) -> StaffId {
        self.actor.staff_id
    }

    /// Returns the staff member's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.claims.name
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts.extensions.get::<Actor>().copied();
        let claims = parts.extensions.get::<Claims>().cloned();

        match (actor, claims) {
            (Some(actor), Some(claims)) => Ok(Self { actor, claims }),
            _ => Err(app_error_response(&AppError::Unauthorized(
                "Authentication required".to_string(),
            ))),
        }
    }
}
