//! Handlers for the `/students` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use projecthub_core::contact::{normalize_email, validate_email, validate_phone};
use projecthub_core::enrollment;
use projecthub_core::error::CoreError;
use projecthub_core::roles::Role;
use projecthub_core::types::DbId;
use projecthub_db::models::student::{CreateStudent, RegisterStudent, StudentResponse};
use projecthub_db::repositories::{DivisionRepo, StudentRepo};
use serde::Deserialize;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /students`.
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub enrollment_number: String,
    pub division_id: DbId,
    pub name: Option<String>,
}

/// Request body for `POST /students/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterStudentRequest {
    pub enrollment_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// POST /api/v1/students
///
/// Add a single unregistered student to a division.
pub async fn create_student(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateStudentRequest>,
) -> AppResult<impl IntoResponse> {
    let enrollment_number = input.enrollment_number.trim().to_uppercase();
    if !enrollment::is_well_formed(&enrollment_number) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Malformed enrollment number '{enrollment_number}'"
        ))));
    }

    DivisionRepo::find_by_id(&state.pool, input.division_id)
        .await?
        .ok_or(CoreError::not_found("Division", input.division_id))?;

    let student = StudentRepo::create(
        &state.pool,
        &CreateStudent {
            enrollment_number,
            division_id: input.division_id,
            name: input.name.map(|n| n.trim().to_string()),
        },
    )
    .await?;

    tracing::info!(
        student_id = student.id,
        division_id = student.division_id,
        user_id = admin.user_id,
        "Student created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: StudentResponse::from(student),
        }),
    ))
}

/// GET /api/v1/students/{id}
///
/// Students may only read their own record.
pub async fn get_student(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StudentResponse>>> {
    if user.role == Role::Student && user.user_id != id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Students may only view their own record".into(),
        )));
    }

    let student = StudentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::not_found("Student", id))?;

    Ok(Json(DataResponse {
        data: student.into(),
    }))
}

/// DELETE /api/v1/students/{id}
///
/// Takes the student off its group first so no roster keeps a dangling id.
pub async fn delete_student(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let left_group = state.membership().release_student(id, &admin.caller()).await?;

    if !StudentRepo::delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Student", id).into());
    }

    tracing::info!(
        student_id = id,
        left_group = ?left_group,
        user_id = admin.user_id,
        "Student deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/students/{id}/group
///
/// Take a student off its group without deleting it. Also clears a
/// `group_id` left pointing at a group whose roster no longer lists the
/// student. The roster minimum is not enforced here.
pub async fn detach_student(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StudentResponse>>> {
    let left_group = state.membership().release_student(id, &admin.caller()).await?;

    let student = StudentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::not_found("Student", id))?;

    tracing::info!(
        student_id = id,
        left_group = ?left_group,
        user_id = admin.user_id,
        "Student detached from group"
    );

    Ok(Json(DataResponse {
        data: student.into(),
    }))
}

/// POST /api/v1/students/register
///
/// Public self-registration for a student row an admin created or generated.
pub async fn register_student(
    State(state): State<AppState>,
    Json(input): Json<RegisterStudentRequest>,
) -> AppResult<Json<DataResponse<StudentResponse>>> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name must not be empty".into(),
        )));
    }
    let email = normalize_email(&input.email);
    validate_email(&email).map_err(CoreError::Validation)?;
    let phone = input.phone.trim();
    validate_phone(phone).map_err(CoreError::Validation)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(CoreError::Validation)?;

    let enrollment_number = input.enrollment_number.trim().to_uppercase();
    let student = StudentRepo::find_by_enrollment_number(&state.pool, &enrollment_number)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "No student with enrollment number '{enrollment_number}'"
            )))
        })?;
    if student.is_registered {
        return Err(already_registered(&enrollment_number));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let registered = StudentRepo::register(
        &state.pool,
        student.id,
        &RegisterStudent {
            name: name.to_string(),
            email,
            phone: phone.to_string(),
            password_hash,
        },
    )
    .await?
    .ok_or_else(|| already_registered(&enrollment_number))?;

    tracing::info!(student_id = registered.id, "Student registered");

    Ok(Json(DataResponse {
        data: registered.into(),
    }))
}

fn already_registered(enrollment_number: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Student '{enrollment_number}' is already registered"
    )))
}
