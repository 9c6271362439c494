//! Repository for the `students` table.
//!
//! Membership-side writes (`attach`/`detach`) are single statements over an
//! id set so a roster change touches every student row in one round trip.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::student::{CreateStudent, RegisterStudent, Student};

const COLUMNS: &str = "id, enrollment_number, name, email, phone, password_hash, \
    division_id, group_id, is_registered, created_at, updated_at";

pub struct StudentRepo;

impl StudentRepo {
    /// Insert an unregistered student.
    pub async fn create(pool: &PgPool, input: &CreateStudent) -> Result<Student, sqlx::Error> {
        let query = format!(
            "INSERT INTO students (enrollment_number, division_id, name)
             VALUES ($1, $2, COALESCE($3, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(&input.enrollment_number)
            .bind(input.division_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Insert unregistered students in one statement, skipping enrollment
    /// numbers that already exist. Returns the numbers actually inserted.
    pub async fn create_many_unregistered(
        pool: &PgPool,
        enrollment_numbers: &[String],
        division_ids: &[DbId],
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO students (enrollment_number, division_id)
             SELECT * FROM UNNEST($1::text[], $2::bigint[])
             ON CONFLICT ON CONSTRAINT uq_students_enrollment_number DO NOTHING
             RETURNING enrollment_number",
        )
        .bind(enrollment_numbers)
        .bind(division_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_enrollment_number(
        pool: &PgPool,
        enrollment_number: &str,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE enrollment_number = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(enrollment_number)
            .fetch_optional(pool)
            .await
    }

    /// Fetch every student in `ids`. Missing ids are absent from the result.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE id = ANY($1)");
        sqlx::query_as::<_, Student>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Which of `numbers` already exist.
    pub async fn existing_enrollment_numbers(
        pool: &PgPool,
        numbers: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT enrollment_number FROM students WHERE enrollment_number = ANY($1)",
        )
        .bind(numbers)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_division(
        pool: &PgPool,
        division_id: DbId,
    ) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM students WHERE division_id = $1 ORDER BY enrollment_number"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(division_id)
            .fetch_all(pool)
            .await
    }

    /// Students of a division with no group, plus members of
    /// `excluding_group_id` when given.
    pub async fn list_available(
        pool: &PgPool,
        division_id: DbId,
        excluding_group_id: Option<DbId>,
    ) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM students
             WHERE division_id = $1
               AND (group_id IS NULL OR group_id = $2)
             ORDER BY enrollment_number"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(division_id)
            .bind(excluding_group_id)
            .fetch_all(pool)
            .await
    }

    /// Complete self-registration. Only matches rows that are still
    /// unregistered; returns `None` otherwise.
    pub async fn register(
        pool: &PgPool,
        id: DbId,
        input: &RegisterStudent,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!(
            "UPDATE students SET
                name = $2,
                email = $3,
                phone = $4,
                password_hash = $5,
                is_registered = TRUE
             WHERE id = $1 AND is_registered = FALSE
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Point students at `group_id` where they are unassigned or already
    /// there. Returns the number of rows matched.
    pub async fn attach(pool: &PgPool, group_id: DbId, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE students SET group_id = $1
             WHERE id = ANY($2) AND (group_id IS NULL OR group_id = $1)",
        )
        .bind(group_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Clear `group_id` on students that still point at it.
    pub async fn detach(pool: &PgPool, group_id: DbId, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE students SET group_id = NULL WHERE id = ANY($2) AND group_id = $1",
        )
        .bind(group_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Students of the division that are currently on a group.
    pub async fn count_grouped_in_division(
        pool: &PgPool,
        division_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM students WHERE division_id = $1 AND group_id IS NOT NULL",
        )
        .bind(division_id)
        .fetch_one(pool)
        .await
    }

    /// Permanently delete a student. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every ungrouped student of a division. Returns the count.
    pub async fn delete_ungrouped_by_division(
        pool: &PgPool,
        division_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM students WHERE division_id = $1 AND group_id IS NULL")
                .bind(division_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
