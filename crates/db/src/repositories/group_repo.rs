//! Repository for the `groups` table.
//!
//! Roster and guide writes are compare-and-swap on `version`: they only
//! apply when the caller saw the current version, and bump it.

use projecthub_core::membership::{MemberSnapshot, NewGroup};
use projecthub_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::group::{Group, UpdateGroup};

const COLUMNS: &str = "id, name, guide_id, division_id, project_title, project_description, \
    project_technology, year, status, student_ids, members_snapshot, version, \
    created_at, updated_at";

pub struct GroupRepo;

impl GroupRepo {
    /// Insert an empty group.
    pub async fn create(pool: &PgPool, input: &NewGroup) -> Result<Group, sqlx::Error> {
        let query = format!(
            "INSERT INTO groups
                (name, guide_id, division_id, project_title, project_description,
                 project_technology, year)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(&input.name)
            .bind(input.guide_id)
            .bind(input.division_id)
            .bind(&input.project_title)
            .bind(&input.project_description)
            .bind(&input.project_technology)
            .bind(input.year)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE id = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All groups, optionally limited to one division.
    pub async fn list(pool: &PgPool, division_id: Option<DbId>) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM groups
             WHERE ($1::bigint IS NULL OR division_id = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(division_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_guide(pool: &PgPool, guide_id: DbId) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM groups WHERE guide_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(guide_id)
            .fetch_all(pool)
            .await
    }

    /// The group whose roster contains the student, if any.
    pub async fn find_by_member(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE $1 = ANY(student_ids)");
        sqlx::query_as::<_, Group>(&query)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// Patch descriptive fields. Only non-`None` fields are applied.
    pub async fn update_details(
        pool: &PgPool,
        id: DbId,
        input: &UpdateGroup,
    ) -> Result<Option<Group>, sqlx::Error> {
        let query = format!(
            "UPDATE groups SET
                name = COALESCE($2, name),
                project_title = COALESCE($3, project_title),
                project_description = COALESCE($4, project_description),
                project_technology = COALESCE($5, project_technology),
                year = COALESCE($6, year),
                status = COALESCE($7, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.project_title)
            .bind(&input.project_description)
            .bind(&input.project_technology)
            .bind(input.year)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Replace roster and snapshot if `version` still equals
    /// `expected_version`. Returns `false` when the swap lost.
    pub async fn write_roster(
        pool: &PgPool,
        id: DbId,
        expected_version: i32,
        student_ids: &[DbId],
        snapshot: &[MemberSnapshot],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE groups SET
                student_ids = $3,
                members_snapshot = $4,
                version = version + 1
             WHERE id = $1 AND version = $2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(student_ids)
        .bind(Json(snapshot))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Point the group at a new guide under the same version check.
    pub async fn write_guide(
        pool: &PgPool,
        id: DbId,
        expected_version: i32,
        guide_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE groups SET guide_id = $3, version = version + 1
             WHERE id = $1 AND version = $2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(guide_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a group and clear its members' back-references in one
    /// transaction. Returns `false` if no such group existed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE students SET group_id = NULL WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
