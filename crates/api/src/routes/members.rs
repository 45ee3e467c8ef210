//! Member registry routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use koperasi_core::member::{Member, MemberStatus, MemberTotals, RegisterMemberInput};
use koperasi_db::MemberFilter;
use koperasi_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;

use super::member_number;
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the member routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/members", post(register_member).get(list_members))
        .route("/members/{number}", get(get_member).delete(delete_member))
        .route("/members/{number}/deactivate", post(deactivate_member))
        .route("/members/{number}/totals", get(member_totals))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing members.
#[derive(Debug, Deserialize)]
pub struct ListMembersQuery {
    /// Filter by status (`aktif` / `nonaktif`).
    pub status: Option<MemberStatus>,
    /// Substring of the member number or name.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// Request body for deactivating a member.
#[derive(Debug, Deserialize)]
pub struct DeactivateMemberRequest {
    /// Why the member leaves.
    pub reason: String,
    /// Effective date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/members` - Register a member.
async fn register_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<RegisterMemberInput>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let member = state.members().register(&auth.actor, &input).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET `/members` - List members ordered by number.
async fn list_members(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListMembersQuery>,
) -> ApiResult<Json<PageResponse<Member>>> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = MemberFilter {
        status: query.status,
        search: query.search,
    };

    Ok(Json(state.members().list(&filter, &page).await?))
}

/// GET `/members/{number}` - Get a member.
async fn get_member(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<Member>> {
    let number = member_number(&number)?;
    Ok(Json(state.members().find(&number).await?))
}

/// POST `/members/{number}/deactivate` - Deactivate a member.
async fn deactivate_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(number): Path<String>,
    Json(request): Json<DeactivateMemberRequest>,
) -> ApiResult<Json<Member>> {
    let number = member_number(&number)?;
    let member = state
        .members()
        .deactivate(&auth.actor, &number, &request.reason, request.date)
        .await?;
    Ok(Json(member))
}

/// DELETE `/members/{number}` - Delete a member with no financial records.
async fn delete_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<StatusCode> {
    let number = member_number(&number)?;
    state.members().delete(&auth.actor, &number).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/members/{number}/totals` - Deposits, withdrawals and balance across all savings.
async fn member_totals(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<MemberTotals>> {
    let number = member_number(&number)?;
    Ok(Json(state.members().totals(&number).await?))
}
