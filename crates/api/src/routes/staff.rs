//! Staff record routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use koperasi_core::{CoreError, Role};
use koperasi_db::CreateStaffInput;
use koperasi_db::entities::staff;
use koperasi_shared::types::StaffId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the staff routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/staff", post(create_staff))
        .route("/staff/{id}", get(get_staff).delete(delete_staff))
}

/// Request body for creating a staff record.
#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    /// Identity-provider subject; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Login name.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: Role,
}

/// Response for a staff record.
#[derive(Debug, Serialize)]
pub struct StaffResponse {
    /// Staff ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: String,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
}

impl From<staff::Model> for StaffResponse {
    fn from(model: staff::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

/// POST `/staff` - Create a staff record.
async fn create_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateStaffRequest>,
) -> ApiResult<(StatusCode, Json<StaffResponse>)> {
    let input = CreateStaffInput {
        id: request.id.map(StaffId::from_uuid),
        username: request.username,
        full_name: request.full_name,
        role: request.role,
    };

    let created = state.staff().create(&auth.actor, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/staff/{id}` - Get a staff record.
async fn get_staff(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StaffResponse>> {
    let id = StaffId::from_uuid(id);
    let found = state
        .staff()
        .find_by_id(id)
        .await?
        .ok_or(CoreError::StaffNotFound(id))?;
    Ok(Json(found.into()))
}

/// DELETE `/staff/{id}` - Delete a staff record no loan or savings row references.
async fn delete_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .staff()
        .delete(&auth.actor, StaffId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
