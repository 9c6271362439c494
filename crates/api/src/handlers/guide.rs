//! Handlers for the `/guides` resource: self-registration and admin review.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use projecthub_core::contact::{normalize_email, validate_email, validate_phone};
use projecthub_core::error::CoreError;
use projecthub_core::guide;
use projecthub_core::roles::Role;
use projecthub_core::types::DbId;
use projecthub_db::models::guide::{CreateGuide, GuideResponse};
use projecthub_db::repositories::GuideRepo;
use projecthub_events::DomainEvent;
use serde::Deserialize;
use serde_json::json;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::StatusFilter;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /guides/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterGuideRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_id: String,
    pub expertise: Option<String>,
    pub password: String,
}

/// Request body for `PATCH /guides/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewGuideRequest {
    pub status: String,
}

/// POST /api/v1/guides/register
///
/// Public. New guides start `pending` and cannot sign in until approved.
pub async fn register_guide(
    State(state): State<AppState>,
    Json(input): Json<RegisterGuideRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input.name.trim();
    let employee_id = input.employee_id.trim();
    if name.is_empty() || employee_id.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name and employee id are required".into(),
        )));
    }
    let email = normalize_email(&input.email);
    validate_email(&email).map_err(CoreError::Validation)?;
    let phone = input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    if let Some(phone) = phone {
        validate_phone(phone).map_err(CoreError::Validation)?;
    }
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(CoreError::Validation)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let created = GuideRepo::create(
        &state.pool,
        &CreateGuide {
            name: name.to_string(),
            email,
            phone: phone.map(str::to_string),
            employee_id: employee_id.to_string(),
            expertise: input.expertise.map(|e| e.trim().to_string()),
            password_hash,
        },
    )
    .await?;

    tracing::info!(guide_id = created.id, "Guide registered, awaiting review");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: GuideResponse::from(created),
        }),
    ))
}

/// GET /api/v1/guides?status=
pub async fn list_guides(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<StatusFilter>,
) -> AppResult<Json<DataResponse<Vec<GuideResponse>>>> {
    if let Some(status) = params.status.as_deref() {
        guide::validate_status(status).map_err(CoreError::Validation)?;
    }
    let guides = GuideRepo::list(&state.pool, params.status.as_deref())
        .await?
        .into_iter()
        .map(GuideResponse::from)
        .collect();
    Ok(Json(DataResponse { data: guides }))
}

/// GET /api/v1/guides/{id}
///
/// Admins read any guide; a guide reads only itself.
pub async fn get_guide(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<GuideResponse>>> {
    match user.role {
        Role::Admin => {}
        Role::Guide if user.user_id == id => {}
        _ => {
            return Err(AppError::Core(CoreError::Forbidden(
                "Not allowed to view this guide".into(),
            )))
        }
    }

    let found = GuideRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::not_found("Guide", id))?;
    Ok(Json(DataResponse { data: found.into() }))
}

/// PATCH /api/v1/guides/{id}/review
///
/// Approve or reject a guide. The guide is emailed about the decision in the
/// background; delivery problems never undo the status change.
pub async fn review_guide(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewGuideRequest>,
) -> AppResult<Json<DataResponse<GuideResponse>>> {
    let status = input.status.trim().to_lowercase();
    guide::validate_review_decision(&status)
        .map_err(CoreError::Validation)?;

    let updated = GuideRepo::set_status(&state.pool, id, &status)
        .await?
        .ok_or(CoreError::not_found("Guide", id))?;

    tracing::info!(guide_id = id, status = %status, user_id = admin.user_id, "Guide reviewed");

    if let Some(event_type) = guide::review_event_type(&status) {
        state.event_bus.publish(
            DomainEvent::new(event_type)
                .about("guide", id)
                .by(admin.role, admin.user_id)
                .notify(updated.email.clone())
                .with_payload(json!({ "name": updated.name, "status": status })),
        );
    }

    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}

/// PATCH /api/v1/guides/{id}/active
pub async fn toggle_guide_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<GuideResponse>>> {
    let updated = GuideRepo::toggle_active(&state.pool, id)
        .await?
        .ok_or(CoreError::not_found("Guide", id))?;

    tracing::info!(
        guide_id = id,
        is_active = updated.is_active,
        user_id = admin.user_id,
        "Guide active flag toggled"
    );

    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}
