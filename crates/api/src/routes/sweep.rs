//! Auto-sweep routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use koperasi_core::sweep::SweepReport;

use super::member_number;
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the sweep routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sweep", post(sweep_all))
        .route("/members/{number}/sweep", post(sweep_member))
}

/// POST `/sweep` - Sweep every active member with an active loan.
///
/// Per-member failures are reported in `failed`; the request still succeeds.
async fn sweep_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SweepReport>> {
    Ok(Json(state.sweeps().sweep_all(&auth.actor).await?))
}

/// POST `/members/{number}/sweep` - Sweep one member's active loans.
async fn sweep_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<SweepReport>> {
    let number = member_number(&number)?;
    Ok(Json(state.sweeps().sweep_member(&auth.actor, &number).await?))
}
