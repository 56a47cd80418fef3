use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use roster_members::{BalanceStatus, MemberFilter, MemberRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{ApiError, AppState};

/// A stored member plus the values derived from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub member: MemberRecord,
    pub full_name: String,
    pub is_locked: bool,
    pub balance_status: BalanceStatus,
}

impl From<MemberRecord> for MemberView {
    fn from(member: MemberRecord) -> Self {
        Self {
            full_name: member.full_name(),
            is_locked: member.is_locked(),
            balance_status: member.balance_status(),
            member,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembersResponse {
    #[schema(value_type = Vec<Object>)]
    pub members: Vec<MemberView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    #[schema(value_type = Object)]
    pub member: MemberView,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// Membership status, compared case-insensitively
    pub status: Option<String>,
    /// Position the member must hold
    pub position: Option<String>,
    /// Group the member must belong to
    pub group: Option<String>,
}

impl From<MemberQuery> for MemberFilter {
    fn from(query: MemberQuery) -> Self {
        MemberFilter {
            status: query.status,
            position: query.position,
            group: query.group,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Members matching the filter, in creation order", body = MembersResponse),
        (status = 500, description = "Failed to fetch members", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> Result<Json<MembersResponse>, ApiError> {
    let members = state.members().list_members(&query.into()).await?;

    Ok(Json(MembersResponse {
        members: members.into_iter().map(MemberView::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{member_id}",
    tag = "Members",
    params(
        ("member_id" = String, Path, description = "24-character hexadecimal member identifier")
    ),
    responses(
        (status = 200, description = "Member fetched", body = MemberResponse),
        (status = 400, description = "Malformed member identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to fetch member", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = state.members().get_member(&member_id).await?;

    Ok(Json(MemberResponse {
        member: member.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Members",
    request_body = Value,
    responses(
        (status = 201, description = "Member created", body = MemberResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to create member", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let Json(raw) = payload?;
    let member = state.members().create_member(&raw).await?;

    Ok((
        StatusCode::CREATED,
        Json(MemberResponse {
            member: member.into(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{member_id}",
    tag = "Members",
    params(
        ("member_id" = String, Path, description = "24-character hexadecimal member identifier")
    ),
    request_body = Value,
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Validation error or malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to update member", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MemberResponse>, ApiError> {
    let Json(raw) = payload?;
    let member = state.members().update_member(&member_id, &raw).await?;

    Ok(Json(MemberResponse {
        member: member.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/{member_id}",
    tag = "Members",
    params(
        ("member_id" = String, Path, description = "24-character hexadecimal member identifier")
    ),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 400, description = "Malformed member identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to delete member", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.members().delete_member(&member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
