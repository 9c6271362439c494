//! PostgreSQL implementation of the membership engine's store.

use async_trait::async_trait;
use projecthub_core::membership::{
    DivisionRecord, GroupRecord, GuideRecord, MembershipStore, NewGroup, NewStudent, RosterWrite,
    StoreError, StudentRecord,
};
use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::repositories::{DivisionRepo, GroupRepo, GuideRepo, StudentRepo};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error into the store's two-way split. Unique violations
/// become [`StoreError::Conflict`] carrying the constraint name.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unique constraint");
            return StoreError::Conflict(format!("Duplicate value violates {constraint}"));
        }
    }
    StoreError::Backend(err.to_string())
}

#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn find_group(&self, id: DbId) -> Result<Option<GroupRecord>, StoreError> {
        let group = GroupRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(group.map(Into::into))
    }

    async fn find_division(&self, id: DbId) -> Result<Option<DivisionRecord>, StoreError> {
        let division = DivisionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(division.map(Into::into))
    }

    async fn find_guide(&self, id: DbId) -> Result<Option<GuideRecord>, StoreError> {
        let guide = GuideRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(guide.map(Into::into))
    }

    async fn find_students(&self, ids: &[DbId]) -> Result<Vec<StudentRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let students = StudentRepo::find_by_ids(&self.pool, ids)
            .await
            .map_err(store_error)?;
        Ok(students.into_iter().map(Into::into).collect())
    }

    async fn list_available_students(
        &self,
        division_id: DbId,
        excluding_group_id: Option<DbId>,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let students = StudentRepo::list_available(&self.pool, division_id, excluding_group_id)
            .await
            .map_err(store_error)?;
        Ok(students.into_iter().map(Into::into).collect())
    }

    async fn existing_enrollment_numbers(
        &self,
        candidates: &[String],
    ) -> Result<Vec<String>, StoreError> {
        StudentRepo::existing_enrollment_numbers(&self.pool, candidates)
            .await
            .map_err(store_error)
    }

    async fn insert_students(&self, students: &[NewStudent]) -> Result<Vec<String>, StoreError> {
        let (numbers, divisions): (Vec<String>, Vec<DbId>) = students
            .iter()
            .map(|s| (s.enrollment_number.clone(), s.division_id))
            .unzip();
        StudentRepo::create_many_unregistered(&self.pool, &numbers, &divisions)
            .await
            .map_err(store_error)
    }

    async fn insert_group(&self, group: &NewGroup) -> Result<GroupRecord, StoreError> {
        let created = GroupRepo::create(&self.pool, group)
            .await
            .map_err(store_error)?;
        Ok(created.into())
    }

    async fn delete_group(&self, group_id: DbId) -> Result<bool, StoreError> {
        GroupRepo::delete(&self.pool, group_id)
            .await
            .map_err(store_error)
    }

    async fn write_roster(&self, write: RosterWrite<'_>) -> Result<bool, StoreError> {
        GroupRepo::write_roster(
            &self.pool,
            write.group_id,
            write.expected_version,
            write.student_ids,
            write.snapshot,
        )
        .await
        .map_err(store_error)
    }

    async fn write_group_guide(
        &self,
        group_id: DbId,
        expected_version: i32,
        guide_id: DbId,
    ) -> Result<bool, StoreError> {
        GroupRepo::write_guide(&self.pool, group_id, expected_version, guide_id)
            .await
            .map_err(store_error)
    }

    async fn detach_students(
        &self,
        group_id: DbId,
        student_ids: &[DbId],
    ) -> Result<u64, StoreError> {
        StudentRepo::detach(&self.pool, group_id, student_ids)
            .await
            .map_err(store_error)
    }

    async fn attach_students(
        &self,
        group_id: DbId,
        student_ids: &[DbId],
    ) -> Result<u64, StoreError> {
        StudentRepo::attach(&self.pool, group_id, student_ids)
            .await
            .map_err(store_error)
    }

    async fn link_guide_group(&self, guide_id: DbId, group_id: DbId) -> Result<(), StoreError> {
        GuideRepo::link_group(&self.pool, guide_id, group_id)
            .await
            .map_err(store_error)
    }

    async fn unlink_guide_group(&self, guide_id: DbId, group_id: DbId) -> Result<(), StoreError> {
        GuideRepo::unlink_group(&self.pool, guide_id, group_id)
            .await
            .map_err(store_error)
    }
}
