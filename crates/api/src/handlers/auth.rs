//! Handlers for the `/auth` resource.
//!
//! Admins, guides and students live in separate tables, so the login body
//! names the role and the identifier is looked up in that role's table.

use axum::extract::State;
use axum::Json;
use projecthub_core::contact::normalize_email;
use projecthub_core::error::CoreError;
use projecthub_core::guide;
use projecthub_core::roles::Role;
use projecthub_core::types::DbId;
use projecthub_db::models::admin::AdminResponse;
use projecthub_db::models::guide::GuideResponse;
use projecthub_db::models::student::StudentResponse;
use projecthub_db::repositories::{AdminRepo, GuideRepo, StudentRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub role: Role,
    /// Email for admins and guides, enrollment number for students.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub name: String,
    pub role: Role,
}

/// Body of `GET /auth/me`, shaped by the caller's role.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Admin(AdminResponse),
    Guide(GuideResponse),
    Student(StudentResponse),
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (id, name) = match input.role {
        Role::Admin => {
            let admin = AdminRepo::find_by_email(&state.pool, &normalize_email(&input.identifier))
                .await?
                .ok_or_else(invalid_credentials)?;
            check_password(&input.password, &admin.password_hash)?;
            (admin.id, admin.name)
        }
        Role::Guide => {
            let guide = GuideRepo::find_by_email(&state.pool, &normalize_email(&input.identifier))
                .await?
                .ok_or_else(invalid_credentials)?;
            check_password(&input.password, &guide.password_hash)?;
            if guide.status != guide::STATUS_APPROVED {
                return Err(AppError::Core(CoreError::Forbidden(format!(
                    "Guide account is {}",
                    guide.status
                ))));
            }
            if !guide.is_active {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Guide account is deactivated".into(),
                )));
            }
            (guide.id, guide.name)
        }
        Role::Student => {
            let enrollment_number = input.identifier.trim().to_uppercase();
            let student = StudentRepo::find_by_enrollment_number(&state.pool, &enrollment_number)
                .await?
                .ok_or_else(invalid_credentials)?;
            let Some(hash) = student.password_hash.as_deref().filter(|_| student.is_registered)
            else {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Student has not completed registration".into(),
                )));
            };
            check_password(&input.password, hash)?;
            (student.id, student.name)
        }
    };

    let access_token = generate_access_token(id, input.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = id, role = %input.role, "Login succeeded");

    Ok(Json(AuthResponse {
        access_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserInfo {
            id,
            name,
            role: input.role,
        },
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Profile>>> {
    let not_found = || AppError::from(CoreError::not_found("User", user.user_id));

    let profile = match user.role {
        Role::Admin => AdminRepo::find_by_id(&state.pool, user.user_id)
            .await?
            .map(|a| Profile::Admin(a.into())),
        Role::Guide => GuideRepo::find_by_id(&state.pool, user.user_id)
            .await?
            .map(|g| Profile::Guide(g.into())),
        Role::Student => StudentRepo::find_by_id(&state.pool, user.user_id)
            .await?
            .map(|s| Profile::Student(s.into())),
    }
    .ok_or_else(not_found)?;

    Ok(Json(DataResponse { data: profile }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into()))
}

fn check_password(password: &str, hash: &str) -> AppResult<()> {
    let valid = verify_password(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(invalid_credentials());
    }
    Ok(())
}
