//! Membership management endpoints (owners and admins).

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::OrgContext;

use api_types::membership::{MemberNew, MemberView, MembersResponse, RoleUpdate};

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_members(&ctx)
        .await?
        .into_iter()
        .map(views::member)
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn add(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let membership = state
        .engine
        .add_member(&ctx, payload.user_id, views::engine_role(payload.role))
        .await?;
    Ok((StatusCode::CREATED, Json(views::member(membership))))
}

pub async fn change_role(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<MemberView>, ServerError> {
    let membership = state
        .engine
        .change_member_role(&ctx, user_id, views::engine_role(payload.role))
        .await?;
    Ok(Json(views::member(membership)))
}

pub async fn remove(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.deactivate_member(&ctx, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
