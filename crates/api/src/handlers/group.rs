//! Handlers for the `/groups` resource.
//!
//! Every change to who is in a group, or who supervises it, goes through
//! the membership engine. Project details are plain row updates.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use projecthub_core::error::CoreError;
use projecthub_core::group;
use projecthub_core::membership::{rules, GroupProjection, GroupRecord, NewGroup};
use projecthub_core::roles::Role;
use projecthub_core::types::DbId;
use projecthub_db::models::group::{Group, UpdateGroup};
use projecthub_db::repositories::GroupRepo;
use projecthub_events::DomainEvent;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireStaff};
use crate::query::GroupListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /groups`.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub division_id: DbId,
    /// Required for admins. A guide may omit it or name itself.
    pub guide_id: Option<DbId>,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub project_technology: Option<String>,
    pub year: Option<i32>,
}

/// Request body for `PUT` and `POST /groups/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct MemberIdsRequest {
    pub student_ids: Vec<DbId>,
}

/// Request body for `PATCH /groups/{id}/guide`.
#[derive(Debug, Deserialize)]
pub struct ReassignGuideRequest {
    pub guide_id: DbId,
}

// ---------------------------------------------------------------------------
// Group CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/groups
pub async fn create_group(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupRequest>,
) -> AppResult<impl IntoResponse> {
    let guide_id = match (user.role, input.guide_id) {
        (_, Some(guide_id)) => guide_id,
        (Role::Guide, None) => user.user_id,
        _ => return Err(AppError::BadRequest("guide_id is required".into())),
    };

    let projection = state
        .membership()
        .create_group(
            &user.caller(),
            &NewGroup {
                name: input.name.trim().to_string(),
                guide_id,
                division_id: input.division_id,
                project_title: input.project_title,
                project_description: input.project_description,
                project_technology: input.project_technology,
                year: input.year,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: projection })))
}

/// GET /api/v1/groups?division_id=
///
/// Admins see every group (optionally one division's), guides the groups
/// they supervise, students the group they belong to.
pub async fn list_groups(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<GroupListParams>,
) -> AppResult<Json<DataResponse<Vec<Group>>>> {
    let groups = match user.role {
        Role::Admin => GroupRepo::list(&state.pool, params.division_id).await?,
        Role::Guide => GroupRepo::list_by_guide(&state.pool, user.user_id).await?,
        Role::Student => GroupRepo::find_by_member(&state.pool, user.user_id)
            .await?
            .into_iter()
            .collect(),
    };
    Ok(Json(DataResponse { data: groups }))
}

/// GET /api/v1/groups/{id}
pub async fn get_group(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<GroupProjection>>> {
    let engine = state.membership();
    let projection = engine.group_projection(id).await?;

    let allowed = match user.role {
        Role::Admin => true,
        Role::Guide => projection.guide.id == user.user_id,
        Role::Student => projection.members.iter().any(|m| m.id == user.user_id),
    };
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not allowed to view this group".into(),
        )));
    }

    Ok(Json(DataResponse { data: projection }))
}

/// PATCH /api/v1/groups/{id}
///
/// Update name, project details or status. Admin or the supervising guide.
pub async fn update_group(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateGroup>,
) -> AppResult<Json<DataResponse<GroupProjection>>> {
    let current: GroupRecord = GroupRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::not_found("Group", id))?
        .into();
    rules::authorize_group_edit(&user.caller(), &current)?;

    if let Some(name) = input.name.as_deref() {
        group::validate_name(name).map_err(CoreError::Validation)?;
    }
    if let Some(status) = input.status.as_deref() {
        group::validate_status(status).map_err(CoreError::Validation)?;
    }
    let input = UpdateGroup {
        name: input.name.map(|n| n.trim().to_string()),
        ..input
    };

    GroupRepo::update_details(&state.pool, id, &input)
        .await?
        .ok_or(CoreError::not_found("Group", id))?;

    tracing::info!(
        group_id = id,
        user_id = user.user_id,
        role = %user.role,
        "Group details updated"
    );

    let projection = state.membership().group_projection(id).await?;
    Ok(Json(DataResponse { data: projection }))
}

/// DELETE /api/v1/groups/{id}
pub async fn delete_group(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.membership().dissolve_group(id, &admin.caller()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// PUT /api/v1/groups/{id}/members
///
/// Replace the roster with exactly `student_ids` (3 or 4 students).
pub async fn set_members(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MemberIdsRequest>,
) -> AppResult<Json<DataResponse<GroupProjection>>> {
    let projection = state
        .membership()
        .set_group_members(id, &user.caller(), &input.student_ids)
        .await?;

    publish_roster_event(&state, group::EVENT_MEMBERS_REPLACED, &user, &projection);

    Ok(Json(DataResponse { data: projection }))
}

/// POST /api/v1/groups/{id}/members
///
/// Append `student_ids` to the roster, up to the four-member limit.
pub async fn add_members(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MemberIdsRequest>,
) -> AppResult<Json<DataResponse<GroupProjection>>> {
    let projection = state
        .membership()
        .add_members(id, &user.caller(), &input.student_ids)
        .await?;

    publish_roster_event(&state, group::EVENT_MEMBERS_ADDED, &user, &projection);

    Ok(Json(DataResponse { data: projection }))
}

/// DELETE /api/v1/groups/{id}/members/{student_id}
pub async fn remove_member(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, student_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<GroupProjection>>> {
    let projection = state
        .membership()
        .remove_member(id, &admin.caller(), student_id)
        .await?;

    publish_roster_event(&state, group::EVENT_MEMBER_REMOVED, &admin, &projection);

    Ok(Json(DataResponse { data: projection }))
}

/// PATCH /api/v1/groups/{id}/guide
pub async fn reassign_guide(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReassignGuideRequest>,
) -> AppResult<Json<DataResponse<GroupProjection>>> {
    let projection = state
        .membership()
        .reassign_guide(id, &admin.caller(), input.guide_id)
        .await?;

    state.event_bus.publish(
        DomainEvent::new(group::EVENT_GUIDE_REASSIGNED)
            .about("group", projection.id)
            .by(admin.role, admin.user_id)
            .notify(projection.guide.email.clone())
            .with_payload(json!({
                "group_name": projection.name,
                "guide_id": projection.guide.id,
                "guide_name": projection.guide.name,
            })),
    );

    Ok(Json(DataResponse { data: projection }))
}

fn publish_roster_event(
    state: &AppState,
    event_type: &'static str,
    user: &AuthUser,
    projection: &GroupProjection,
) {
    let member_ids: Vec<DbId> = projection.members.iter().map(|m| m.id).collect();
    state.event_bus.publish(
        DomainEvent::new(event_type)
            .about("group", projection.id)
            .by(user.role, user.user_id)
            .with_payload(json!({
                "group_name": projection.name,
                "student_ids": member_ids,
            })),
    );
}
