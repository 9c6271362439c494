//! Handlers for the `/divisions` resource and its student sub-resources.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use projecthub_core::division;
use projecthub_core::error::CoreError;
use projecthub_core::types::DbId;
use projecthub_db::models::division::{CreateDivision, Division};
use projecthub_db::models::student::StudentResponse;
use projecthub_db::repositories::{DivisionRepo, StudentRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireStaff};
use crate::query::{AvailableStudentsParams, StatusFilter};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /divisions/{id}/enrollments`.
#[derive(Debug, Deserialize)]
pub struct GenerateEnrollmentsRequest {
    pub start_roll: u32,
    pub end_roll: u32,
}

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

// ---------------------------------------------------------------------------
// Division CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/divisions
pub async fn create_division(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateDivision>,
) -> AppResult<impl IntoResponse> {
    let input = CreateDivision {
        course: input.course.trim().to_uppercase(),
        ..input
    };
    division::validate_division(&input.course, input.semester, input.year)
        .map_err(CoreError::Validation)?;

    let created = DivisionRepo::create(&state.pool, &input).await?;

    tracing::info!(
        division_id = created.id,
        course = %created.course,
        semester = created.semester,
        year = created.year,
        user_id = admin.user_id,
        "Division created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/divisions?status=
pub async fn list_divisions(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<StatusFilter>,
) -> AppResult<Json<DataResponse<Vec<Division>>>> {
    if let Some(status) = params.status.as_deref() {
        division::validate_status(status).map_err(CoreError::Validation)?;
    }
    let divisions = DivisionRepo::list(&state.pool, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: divisions }))
}

/// GET /api/v1/divisions/{id}
pub async fn get_division(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Division>>> {
    let found = find_division(&state, id).await?;
    Ok(Json(DataResponse { data: found }))
}

/// PATCH /api/v1/divisions/{id}/status
///
/// Flip between `active` and `inactive`. Inactive divisions accept no new
/// groups.
pub async fn toggle_division_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Division>>> {
    let current = find_division(&state, id).await?;
    let next = division::toggled_status(&current.status);

    let updated = DivisionRepo::set_status(&state.pool, id, next)
        .await?
        .ok_or(CoreError::not_found("Division", id))?;

    tracing::info!(
        division_id = id,
        status = next,
        user_id = admin.user_id,
        "Division status changed"
    );

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/divisions/{id}
///
/// Refused while any student or group still belongs to the division.
pub async fn delete_division(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_division(&state, id).await?;

    let (students, groups) = DivisionRepo::count_references(&state.pool, id).await?;
    if students > 0 || groups > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Division {id} still has {students} students and {groups} groups"
        ))));
    }

    if !DivisionRepo::delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Division", id).into());
    }

    tracing::info!(division_id = id, user_id = admin.user_id, "Division deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Division-scoped students
// ---------------------------------------------------------------------------

/// GET /api/v1/divisions/{id}/students
pub async fn list_division_students(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StudentResponse>>>> {
    find_division(&state, id).await?;
    let students = StudentRepo::list_by_division(&state.pool, id)
        .await?
        .into_iter()
        .map(StudentResponse::from)
        .collect();
    Ok(Json(DataResponse { data: students }))
}

/// DELETE /api/v1/divisions/{id}/students
///
/// Bulk delete, refused while any of the division's students is in a group.
pub async fn delete_division_students(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeletedCount>>> {
    find_division(&state, id).await?;

    let grouped = StudentRepo::count_grouped_in_division(&state.pool, id).await?;
    if grouped > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "{grouped} students of division {id} are still in groups"
        ))));
    }

    let deleted = StudentRepo::delete_ungrouped_by_division(&state.pool, id).await?;

    tracing::info!(division_id = id, deleted, user_id = admin.user_id, "Division students deleted");

    Ok(Json(DataResponse {
        data: DeletedCount { deleted },
    }))
}

/// GET /api/v1/divisions/{id}/available-students?excluding_group_id=
pub async fn available_students(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<AvailableStudentsParams>,
) -> AppResult<impl IntoResponse> {
    let students = state
        .membership()
        .list_available_students(id, params.excluding_group_id)
        .await?;
    Ok(Json(DataResponse { data: students }))
}

/// POST /api/v1/divisions/{id}/enrollments
///
/// Create unregistered students for a roll range. Numbers that already
/// exist are reported as skipped, so re-running a range is harmless.
pub async fn generate_enrollments(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<GenerateEnrollmentsRequest>,
) -> AppResult<impl IntoResponse> {
    let report = state
        .membership()
        .generate_enrollments(id, input.start_roll, input.end_roll)
        .await?;

    tracing::info!(
        division_id = id,
        created = report.created,
        user_id = admin.user_id,
        "Enrollment generation requested"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_division(state: &AppState, id: DbId) -> AppResult<Division> {
    DivisionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Division", id).into())
}
