//! Persistence seam for the membership engine.
//!
//! [`MembershipStore`] is the unit-of-work boundary the engine writes
//! through. Implementations must honour the conditional semantics spelled
//! out on each method: roster and guide writes are compare-and-swap on the
//! group version, and the student-side writes are single bulk statements
//! targeted by id set.

use async_trait::async_trait;
use serde::Serialize;

use crate::membership::snapshot::MemberSnapshot;
use crate::types::DbId;

/// Division fields the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionRecord {
    pub id: DbId,
    pub course: String,
    pub semester: i32,
    pub year: i32,
    pub status: String,
}

/// Student fields the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub id: DbId,
    pub enrollment_number: String,
    pub name: String,
    pub email: Option<String>,
    pub division_id: DbId,
    pub group_id: Option<DbId>,
    pub is_registered: bool,
}

/// Guide fields the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideRecord {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub expertise: Option<String>,
    pub status: String,
    pub is_active: bool,
    pub assigned_group_ids: Vec<DbId>,
}

/// Group fields the engine reads, including the live roster and snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub id: DbId,
    pub name: String,
    pub guide_id: DbId,
    pub division_id: DbId,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub project_technology: Option<String>,
    pub year: Option<i32>,
    pub status: String,
    pub student_ids: Vec<DbId>,
    pub members_snapshot: Vec<MemberSnapshot>,
    /// Optimistic concurrency counter, bumped by every roster or guide write.
    pub version: i32,
}

/// Input for inserting a new, empty group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub guide_id: DbId,
    pub division_id: DbId,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub project_technology: Option<String>,
    pub year: Option<i32>,
}

/// A generated, unregistered student row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub enrollment_number: String,
    pub division_id: DbId,
}

/// A versioned replacement of a group's roster and snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RosterWrite<'a> {
    pub group_id: DbId,
    /// The version read during validation. The write applies only if the
    /// stored version still equals it.
    pub expected_version: i32,
    pub student_ids: &'a [DbId],
    pub snapshot: &'a [MemberSnapshot],
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find_group(&self, id: DbId) -> Result<Option<GroupRecord>, StoreError>;

    async fn find_division(&self, id: DbId) -> Result<Option<DivisionRecord>, StoreError>;

    async fn find_guide(&self, id: DbId) -> Result<Option<GuideRecord>, StoreError>;

    /// Fetch every student whose id is in `ids`. Missing ids are simply
    /// absent from the result; order is unspecified.
    async fn find_students(&self, ids: &[DbId]) -> Result<Vec<StudentRecord>, StoreError>;

    /// Students of `division_id` with no group, or in `excluding_group_id`.
    async fn list_available_students(
        &self,
        division_id: DbId,
        excluding_group_id: Option<DbId>,
    ) -> Result<Vec<StudentRecord>, StoreError>;

    /// Which of `candidates` already exist as enrollment numbers.
    async fn existing_enrollment_numbers(
        &self,
        candidates: &[String],
    ) -> Result<Vec<String>, StoreError>;

    /// Insert unregistered students, silently skipping numbers that already
    /// exist. Returns the enrollment numbers actually inserted.
    async fn insert_students(&self, students: &[NewStudent]) -> Result<Vec<String>, StoreError>;

    async fn insert_group(&self, group: &NewGroup) -> Result<GroupRecord, StoreError>;

    /// Delete a group and clear the back-reference of every student that
    /// pointed at it. Returns `false` if no such group existed.
    async fn delete_group(&self, group_id: DbId) -> Result<bool, StoreError>;

    /// Replace roster and snapshot and bump the version. Returns `false`
    /// without writing when the stored version differs from
    /// `expected_version`.
    async fn write_roster(&self, write: RosterWrite<'_>) -> Result<bool, StoreError>;

    /// Point the group at `guide_id` and bump the version, under the same
    /// compare-and-swap rule as [`write_roster`](Self::write_roster).
    async fn write_group_guide(
        &self,
        group_id: DbId,
        expected_version: i32,
        guide_id: DbId,
    ) -> Result<bool, StoreError>;

    /// Clear `group_id` on the given students, but only on rows that still
    /// point at `group_id`. Returns the number of rows changed.
    async fn detach_students(&self, group_id: DbId, student_ids: &[DbId])
        -> Result<u64, StoreError>;

    /// Set `group_id` on the given students whose back-reference is null or
    /// already `group_id`. Returns the number of rows matched.
    async fn attach_students(&self, group_id: DbId, student_ids: &[DbId])
        -> Result<u64, StoreError>;

    /// Add `group_id` to the guide's assigned groups (idempotent).
    async fn link_guide_group(&self, guide_id: DbId, group_id: DbId) -> Result<(), StoreError>;

    /// Remove `group_id` from the guide's assigned groups (idempotent).
    async fn unlink_guide_group(&self, guide_id: DbId, group_id: DbId) -> Result<(), StoreError>;
}
