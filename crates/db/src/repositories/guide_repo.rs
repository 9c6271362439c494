//! Repository for the `guides` table.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::guide::{CreateGuide, Guide};

const COLUMNS: &str = "id, name, email, phone, employee_id, expertise, password_hash, \
    status, is_active, assigned_group_ids, created_at, updated_at";

pub struct GuideRepo;

impl GuideRepo {
    /// Insert a self-registered guide with status `pending`.
    pub async fn create(pool: &PgPool, input: &CreateGuide) -> Result<Guide, sqlx::Error> {
        let query = format!(
            "INSERT INTO guides (name, email, phone, employee_id, expertise, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Guide>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.employee_id)
            .bind(&input.expertise)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Guide>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM guides WHERE id = $1");
        sqlx::query_as::<_, Guide>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Guide>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM guides WHERE email = $1");
        sqlx::query_as::<_, Guide>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<Guide>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM guides
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Guide>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Set the review status. Returns `None` if the guide does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Guide>, sqlx::Error> {
        let query = format!("UPDATE guides SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Guide>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Flip `is_active`. Returns `None` if the guide does not exist.
    pub async fn toggle_active(pool: &PgPool, id: DbId) -> Result<Option<Guide>, sqlx::Error> {
        let query = format!(
            "UPDATE guides SET is_active = NOT is_active WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Guide>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Add a group to the guide's assignment list if not already present.
    pub async fn link_group(
        pool: &PgPool,
        guide_id: DbId,
        group_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE guides SET assigned_group_ids = array_append(assigned_group_ids, $2)
             WHERE id = $1 AND NOT ($2 = ANY(assigned_group_ids))",
        )
        .bind(guide_id)
        .bind(group_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove a group from the guide's assignment list.
    pub async fn unlink_group(
        pool: &PgPool,
        guide_id: DbId,
        group_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE guides SET assigned_group_ids = array_remove(assigned_group_ids, $2)
             WHERE id = $1",
        )
        .bind(guide_id)
        .bind(group_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
