//! Repository for the `divisions` table.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::division::{CreateDivision, Division};

const COLUMNS: &str = "id, course, semester, year, status, created_at, updated_at";

pub struct DivisionRepo;

impl DivisionRepo {
    /// Insert a new division. Fails on `uq_divisions_course_semester_year`
    /// if the cohort already exists.
    pub async fn create(pool: &PgPool, input: &CreateDivision) -> Result<Division, sqlx::Error> {
        let query = format!(
            "INSERT INTO divisions (course, semester, year)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Division>(&query)
            .bind(&input.course)
            .bind(input.semester)
            .bind(input.year)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Division>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM divisions WHERE id = $1");
        sqlx::query_as::<_, Division>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List divisions, newest cohort first, optionally filtered by status.
    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<Division>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM divisions
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY year DESC, course, semester"
        );
        sqlx::query_as::<_, Division>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Set the status. Returns `None` if the division does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Division>, sqlx::Error> {
        let query = format!("UPDATE divisions SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Division>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Number of students and groups still pointing at the division.
    pub async fn count_references(pool: &PgPool, id: DbId) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM students WHERE division_id = $1),
                (SELECT COUNT(*) FROM groups WHERE division_id = $1)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Permanently delete a division. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM divisions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
