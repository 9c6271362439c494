//! First-run admin provisioning.

use projecthub_core::contact::{normalize_email, validate_email};
use projecthub_db::models::admin::CreateAdmin;
use projecthub_db::repositories::AdminRepo;
use projecthub_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::config::AdminBootstrap;
use crate::error::{AppError, AppResult};

/// Create the configured admin when the `admins` table is empty. Returns
/// whether an account was created.
pub async fn ensure_admin(pool: &DbPool, bootstrap: &AdminBootstrap) -> AppResult<bool> {
    if AdminRepo::count(pool).await? > 0 {
        return Ok(false);
    }

    let email = normalize_email(&bootstrap.email);
    validate_email(&email).map_err(AppError::BadRequest)?;
    validate_password_strength(&bootstrap.password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;
    let password_hash = hash_password(&bootstrap.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let admin = AdminRepo::create(
        pool,
        &CreateAdmin {
            name: "Administrator".to_string(),
            email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(admin_id = admin.id, "Bootstrap admin created");
    Ok(true)
}
