//! Membership operations and their commit protocol.
//!
//! Each mutating operation runs in two phases:
//!
//! 1. **Validate.** Read the group, the division, the guide and every
//!    referenced student, and apply the [`rules`]. No write happens until
//!    every rule has passed.
//! 2. **Commit.** Write the group first with a compare-and-swap on its
//!    version, then apply the student-side (or guide-side) changes as bulk
//!    conditional updates.
//!
//! A lost compare-and-swap means another request changed the group after
//! it was read; the operation re-reads and re-validates, up to
//! `max_attempts` times, and then fails with
//! [`MembershipError::ConcurrentModification`]. Re-validation is what stops
//! two concurrent `add_members` calls from overfilling a group.
//!
//! Once the group write has landed, later failures are reported as
//! [`MembershipError::PartialFailure`] naming the step that failed and the
//! fields already committed. Nothing is rolled back.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;

use crate::division;
use crate::enrollment;
use crate::group;
use crate::membership::error::MembershipError;
use crate::membership::projection::GroupProjection;
use crate::membership::rules;
use crate::membership::snapshot;
use crate::membership::store::{
    DivisionRecord, GroupRecord, GuideRecord, MembershipStore, NewGroup, NewStudent, RosterWrite,
    StoreError, StudentRecord,
};
use crate::membership::CallerIdentity;
use crate::roles::Role;
use crate::types::DbId;

/// Default number of validate-and-commit rounds before giving up on a
/// contended group.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const COMMITTED_ROSTER: &str = "group.student_ids";
const COMMITTED_SNAPSHOT: &str = "group.members_snapshot";
const COMMITTED_GROUP: &str = "group";
const COMMITTED_GROUP_DELETED: &str = "group (deleted, members detached)";
const STEP_DETACH: &str = "students.group_id (detach)";
const STEP_ATTACH: &str = "students.group_id (attach)";
const STEP_GROUP_GUIDE: &str = "group.guide_id";
const STEP_PREVIOUS_GUIDE: &str = "previous_guide.assigned_group_ids";
const STEP_NEW_GUIDE: &str = "guide.assigned_group_ids";

/// Outcome of bulk enrollment generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentReport {
    pub created: usize,
    pub skipped: Vec<String>,
}

pub struct MembershipEngine<S> {
    store: S,
    max_attempts: u32,
}

impl<S: MembershipStore> MembershipEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the retry bound. Values below 1 are treated as 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current projection of a group with live member details.
    pub async fn group_projection(
        &self,
        group_id: DbId,
    ) -> Result<GroupProjection, MembershipError> {
        let group = self.load_group(group_id).await?;
        let guide = self.load_guide(group.guide_id).await?;
        let members = self.store.find_students(&group.student_ids).await?;
        Ok(GroupProjection::build(&group, &guide, &members))
    }

    /// Students of a division that can be picked for a roster: those with
    /// no group, plus the current members of `excluding_group_id`.
    pub async fn list_available_students(
        &self,
        division_id: DbId,
        excluding_group_id: Option<DbId>,
    ) -> Result<Vec<StudentRecord>, MembershipError> {
        self.load_division(division_id).await?;
        let students = self
            .store
            .list_available_students(division_id, excluding_group_id)
            .await?;
        Ok(students)
    }

    // -----------------------------------------------------------------------
    // Roster mutations
    // -----------------------------------------------------------------------

    /// Replace a group's roster with exactly `new_member_ids`.
    pub async fn set_group_members(
        &self,
        group_id: DbId,
        caller: &CallerIdentity,
        new_member_ids: &[DbId],
    ) -> Result<GroupProjection, MembershipError> {
        rules::validate_roster_size(new_member_ids.len())?;
        rules::ensure_unique(new_member_ids)?;

        for attempt in 1..=self.max_attempts {
            let group = self.load_group(group_id).await?;
            rules::authorize_group_edit(caller, &group)?;
            let division = self.load_division(group.division_id).await?;
            let guide = self.load_guide(group.guide_id).await?;

            let found = self.store.find_students(new_member_ids).await?;
            let students = rules::resolve_in_order(new_member_ids, found)?;
            rules::ensure_same_division(&group, &students)?;
            rules::ensure_not_assigned_elsewhere(group.id, &students)?;

            let snapshot =
                snapshot::rebuild(&students, &division, &group.members_snapshot, Utc::now());
            let dropped: Vec<DbId> = group
                .student_ids
                .iter()
                .copied()
                .filter(|id| !new_member_ids.contains(id))
                .collect();

            let write = RosterWrite {
                group_id,
                expected_version: group.version,
                student_ids: new_member_ids,
                snapshot: &snapshot,
            };
            if !self.store.write_roster(write).await? {
                tracing::warn!(group_id, attempt, "Group changed during validation, retrying");
                continue;
            }
            let mut committed = vec![COMMITTED_ROSTER, COMMITTED_SNAPSHOT];

            if !dropped.is_empty() {
                self.store
                    .detach_students(group_id, &dropped)
                    .await
                    .map_err(|e| partial(STEP_DETACH, &committed, e))?;
                committed.push(STEP_DETACH);
            }
            self.attach_all(group_id, new_member_ids, &committed).await?;

            tracing::info!(
                group_id,
                caller_id = caller.id,
                role = %caller.role,
                members = ?new_member_ids,
                dropped = ?dropped,
                "Group roster replaced"
            );

            let updated = GroupRecord {
                student_ids: new_member_ids.to_vec(),
                members_snapshot: snapshot,
                version: group.version + 1,
                ..group
            };
            let members = with_group(students, group_id);
            return Ok(GroupProjection::build(&updated, &guide, &members));
        }

        Err(MembershipError::ConcurrentModification(group_id))
    }

    /// Add students to a group's existing roster.
    pub async fn add_members(
        &self,
        group_id: DbId,
        caller: &CallerIdentity,
        student_ids: &[DbId],
    ) -> Result<GroupProjection, MembershipError> {
        if student_ids.is_empty() {
            return Err(MembershipError::EmptyMemberList);
        }
        rules::ensure_unique(student_ids)?;

        for attempt in 1..=self.max_attempts {
            let group = self.load_group(group_id).await?;
            rules::authorize_group_edit(caller, &group)?;
            rules::ensure_not_members(&group, student_ids)?;
            rules::ensure_capacity(group.student_ids.len(), student_ids.len())?;
            let division = self.load_division(group.division_id).await?;
            let guide = self.load_guide(group.guide_id).await?;

            let found = self.store.find_students(student_ids).await?;
            let added = rules::resolve_in_order(student_ids, found)?;
            rules::ensure_same_division(&group, &added)?;
            rules::ensure_not_assigned_elsewhere(group.id, &added)?;
            let existing = self.store.find_students(&group.student_ids).await?;

            let mut roster = group.student_ids.clone();
            roster.extend_from_slice(student_ids);
            let snapshot =
                snapshot::append(&group.members_snapshot, &added, &division, Utc::now());

            let write = RosterWrite {
                group_id,
                expected_version: group.version,
                student_ids: &roster,
                snapshot: &snapshot,
            };
            if !self.store.write_roster(write).await? {
                tracing::warn!(group_id, attempt, "Group changed during validation, retrying");
                continue;
            }
            let committed = [COMMITTED_ROSTER, COMMITTED_SNAPSHOT];
            self.attach_all(group_id, student_ids, &committed).await?;

            tracing::info!(
                group_id,
                caller_id = caller.id,
                role = %caller.role,
                added = ?student_ids,
                size = roster.len(),
                "Members added to group"
            );

            let updated = GroupRecord {
                student_ids: roster,
                members_snapshot: snapshot,
                version: group.version + 1,
                ..group
            };
            let mut members = existing;
            members.extend(with_group(added, group_id));
            return Ok(GroupProjection::build(&updated, &guide, &members));
        }

        Err(MembershipError::ConcurrentModification(group_id))
    }

    /// Remove one student from a group. Admin only; the roster may not drop
    /// below the staffed minimum through this path.
    pub async fn remove_member(
        &self,
        group_id: DbId,
        caller: &CallerIdentity,
        student_id: DbId,
    ) -> Result<GroupProjection, MembershipError> {
        rules::authorize_admin(caller, "remove a group member")?;

        for attempt in 1..=self.max_attempts {
            let group = self.load_group(group_id).await?;
            if !group.student_ids.contains(&student_id) {
                return Err(MembershipError::NotAMember {
                    group_id,
                    student_id,
                });
            }
            rules::ensure_floor_after_removal(group.student_ids.len())?;
            let guide = self.load_guide(group.guide_id).await?;

            let roster: Vec<DbId> = group
                .student_ids
                .iter()
                .copied()
                .filter(|id| *id != student_id)
                .collect();
            let snapshot = snapshot::without(&group.members_snapshot, student_id);
            let remaining = self.store.find_students(&roster).await?;

            let write = RosterWrite {
                group_id,
                expected_version: group.version,
                student_ids: &roster,
                snapshot: &snapshot,
            };
            if !self.store.write_roster(write).await? {
                tracing::warn!(group_id, attempt, "Group changed during validation, retrying");
                continue;
            }
            let committed = [COMMITTED_ROSTER, COMMITTED_SNAPSHOT];
            self.store
                .detach_students(group_id, &[student_id])
                .await
                .map_err(|e| partial(STEP_DETACH, &committed, e))?;

            tracing::info!(
                group_id,
                student_id,
                caller_id = caller.id,
                "Member removed from group"
            );

            let updated = GroupRecord {
                student_ids: roster,
                members_snapshot: snapshot,
                version: group.version + 1,
                ..group
            };
            return Ok(GroupProjection::build(&updated, &guide, &remaining));
        }

        Err(MembershipError::ConcurrentModification(group_id))
    }

    // -----------------------------------------------------------------------
    // Guide assignment
    // -----------------------------------------------------------------------

    /// Move a group to a different supervising guide, keeping both guides'
    /// `assigned_group_ids` in step with the group's `guide_id`.
    pub async fn reassign_guide(
        &self,
        group_id: DbId,
        caller: &CallerIdentity,
        new_guide_id: DbId,
    ) -> Result<GroupProjection, MembershipError> {
        rules::authorize_admin(caller, "reassign a group's guide")?;

        for attempt in 1..=self.max_attempts {
            let group = self.load_group(group_id).await?;
            let new_guide = self.load_guide(new_guide_id).await?;
            rules::ensure_assignable_guide(&new_guide)?;
            let members = self.store.find_students(&group.student_ids).await?;

            if group.guide_id == new_guide_id {
                // Same guide: only repair the back-reference if it drifted.
                if !new_guide.assigned_group_ids.contains(&group_id) {
                    self.store.link_guide_group(new_guide_id, group_id).await?;
                }
                return Ok(GroupProjection::build(&group, &new_guide, &members));
            }

            let previous_guide_id = group.guide_id;
            if !self
                .store
                .write_group_guide(group_id, group.version, new_guide_id)
                .await?
            {
                tracing::warn!(group_id, attempt, "Group changed during validation, retrying");
                continue;
            }
            let mut committed = vec![STEP_GROUP_GUIDE];

            self.store
                .unlink_guide_group(previous_guide_id, group_id)
                .await
                .map_err(|e| partial(STEP_PREVIOUS_GUIDE, &committed, e))?;
            committed.push(STEP_PREVIOUS_GUIDE);

            self.store
                .link_guide_group(new_guide_id, group_id)
                .await
                .map_err(|e| partial(STEP_NEW_GUIDE, &committed, e))?;

            tracing::info!(
                group_id,
                previous_guide_id,
                new_guide_id,
                caller_id = caller.id,
                "Group guide reassigned"
            );

            let updated = GroupRecord {
                guide_id: new_guide_id,
                version: group.version + 1,
                ..group
            };
            return Ok(GroupProjection::build(&updated, &new_guide, &members));
        }

        Err(MembershipError::ConcurrentModification(group_id))
    }

    // -----------------------------------------------------------------------
    // Group lifecycle
    // -----------------------------------------------------------------------

    /// Create an empty group supervised by `input.guide_id`.
    ///
    /// Guides may only create groups for themselves; admins may name any
    /// approved, active guide.
    pub async fn create_group(
        &self,
        caller: &CallerIdentity,
        input: &NewGroup,
    ) -> Result<GroupProjection, MembershipError> {
        match caller.role {
            Role::Admin => {}
            Role::Guide if caller.id == input.guide_id => {}
            _ => {
                return Err(MembershipError::Forbidden(
                    "Only admins or the supervising guide may create a group".to_string(),
                ))
            }
        }
        group::validate_name(&input.name).map_err(MembershipError::InvalidInput)?;

        let division = self.load_division(input.division_id).await?;
        if division.status != division::STATUS_ACTIVE {
            return Err(MembershipError::InactiveDivision(division.id));
        }
        let guide = self.load_guide(input.guide_id).await?;
        rules::ensure_assignable_guide(&guide)?;

        let created = self.store.insert_group(input).await?;
        self.store
            .link_guide_group(guide.id, created.id)
            .await
            .map_err(|e| partial(STEP_NEW_GUIDE, &[COMMITTED_GROUP], e))?;

        tracing::info!(
            group_id = created.id,
            guide_id = guide.id,
            division_id = division.id,
            caller_id = caller.id,
            "Group created"
        );

        Ok(GroupProjection::build(&created, &guide, &[]))
    }

    /// Delete a group, detaching its members and unlinking its guide.
    /// Returns the group as it was before deletion.
    pub async fn dissolve_group(
        &self,
        group_id: DbId,
        caller: &CallerIdentity,
    ) -> Result<GroupRecord, MembershipError> {
        rules::authorize_admin(caller, "delete a group")?;
        let group = self.load_group(group_id).await?;

        if !self.store.delete_group(group_id).await? {
            return Err(MembershipError::GroupNotFound(group_id));
        }
        self.store
            .unlink_guide_group(group.guide_id, group_id)
            .await
            .map_err(|e| partial(STEP_PREVIOUS_GUIDE, &[COMMITTED_GROUP_DELETED], e))?;

        tracing::info!(
            group_id,
            guide_id = group.guide_id,
            detached = ?group.student_ids,
            caller_id = caller.id,
            "Group dissolved"
        );
        Ok(group)
    }

    /// Take a student off whatever group it is on, either ahead of deleting
    /// the student or as an admin repair. Unlike
    /// [`remove_member`](Self::remove_member) this does not enforce the
    /// roster minimum, and it also clears a back-reference to a group whose
    /// roster does not list the student. Returns the group the student left.
    pub async fn release_student(
        &self,
        student_id: DbId,
        caller: &CallerIdentity,
    ) -> Result<Option<DbId>, MembershipError> {
        rules::authorize_admin(caller, "release a student from its group")?;

        for attempt in 1..=self.max_attempts {
            let student = self
                .store
                .find_students(&[student_id])
                .await?
                .into_iter()
                .next()
                .ok_or(MembershipError::StudentNotFound(student_id))?;
            let Some(group_id) = student.group_id else {
                return Ok(None);
            };

            let group = match self.store.find_group(group_id).await? {
                Some(group) if group.student_ids.contains(&student_id) => group,
                _ => {
                    // Dangling back-reference: only the student side needs fixing.
                    tracing::warn!(student_id, group_id, "Clearing dangling group reference");
                    self.store.detach_students(group_id, &[student_id]).await?;
                    return Ok(Some(group_id));
                }
            };

            let roster: Vec<DbId> = group
                .student_ids
                .iter()
                .copied()
                .filter(|id| *id != student_id)
                .collect();
            let snapshot = snapshot::without(&group.members_snapshot, student_id);
            let write = RosterWrite {
                group_id,
                expected_version: group.version,
                student_ids: &roster,
                snapshot: &snapshot,
            };
            if !self.store.write_roster(write).await? {
                tracing::warn!(group_id, attempt, "Group changed during validation, retrying");
                continue;
            }
            self.store
                .detach_students(group_id, &[student_id])
                .await
                .map_err(|e| partial(STEP_DETACH, &[COMMITTED_ROSTER, COMMITTED_SNAPSHOT], e))?;

            tracing::info!(student_id, group_id, "Student released from group");
            return Ok(Some(group_id));
        }

        Err(MembershipError::ConcurrentModification(student_id))
    }

    // -----------------------------------------------------------------------
    // Enrollment generation
    // -----------------------------------------------------------------------

    /// Create unregistered students for every roll in `start_roll..=end_roll`
    /// whose derived enrollment number does not exist yet.
    pub async fn generate_enrollments(
        &self,
        division_id: DbId,
        start_roll: u32,
        end_roll: u32,
    ) -> Result<EnrollmentReport, MembershipError> {
        enrollment::validate_roll_range(start_roll, end_roll)
            .map_err(MembershipError::InvalidRollRange)?;
        let division = self.load_division(division_id).await?;

        let candidates = enrollment::candidate_numbers(
            &division.course,
            division.year,
            division.semester,
            start_roll,
            end_roll,
        );
        let existing: HashSet<String> = self
            .store
            .existing_enrollment_numbers(&candidates)
            .await?
            .into_iter()
            .collect();
        let plan = enrollment::plan(candidates.clone(), &existing);

        let new_students: Vec<NewStudent> = plan
            .to_create
            .iter()
            .map(|number| NewStudent {
                enrollment_number: number.clone(),
                division_id,
            })
            .collect();
        let inserted: HashSet<String> = if new_students.is_empty() {
            HashSet::new()
        } else {
            self.store
                .insert_students(&new_students)
                .await?
                .into_iter()
                .collect()
        };

        if inserted.len() < new_students.len() {
            tracing::warn!(
                division_id,
                expected = new_students.len(),
                inserted = inserted.len(),
                "Some enrollment numbers were created concurrently"
            );
        }

        let skipped: Vec<String> = candidates
            .into_iter()
            .filter(|number| !inserted.contains(number))
            .collect();

        tracing::info!(
            division_id,
            start_roll,
            end_roll,
            created = inserted.len(),
            skipped = skipped.len(),
            "Enrollments generated"
        );

        Ok(EnrollmentReport {
            created: inserted.len(),
            skipped,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load_group(&self, id: DbId) -> Result<GroupRecord, MembershipError> {
        self.store
            .find_group(id)
            .await?
            .ok_or(MembershipError::GroupNotFound(id))
    }

    async fn load_division(&self, id: DbId) -> Result<DivisionRecord, MembershipError> {
        self.store
            .find_division(id)
            .await?
            .ok_or(MembershipError::DivisionNotFound(id))
    }

    async fn load_guide(&self, id: DbId) -> Result<GuideRecord, MembershipError> {
        self.store
            .find_guide(id)
            .await?
            .ok_or(MembershipError::GuideNotFound(id))
    }

    /// Attach every id or report a partial failure. A short count means a
    /// concurrent request claimed a student between validation and commit.
    async fn attach_all(
        &self,
        group_id: DbId,
        student_ids: &[DbId],
        committed: &[&'static str],
    ) -> Result<(), MembershipError> {
        let matched = self
            .store
            .attach_students(group_id, student_ids)
            .await
            .map_err(|e| partial(STEP_ATTACH, committed, e))?;

        if matched != student_ids.len() as u64 {
            tracing::error!(
                group_id,
                matched,
                expected = student_ids.len(),
                "Students claimed by another group during commit"
            );
            return Err(MembershipError::PartialFailure {
                step: STEP_ATTACH,
                committed: committed.to_vec(),
                reason: format!(
                    "only {matched} of {} students could be attached",
                    student_ids.len()
                ),
            });
        }
        Ok(())
    }
}

fn partial(step: &'static str, committed: &[&'static str], err: StoreError) -> MembershipError {
    tracing::error!(
        step,
        committed = ?committed,
        error = %err,
        "Membership write failed after partial commit"
    );
    MembershipError::PartialFailure {
        step,
        committed: committed.to_vec(),
        reason: err.to_string(),
    }
}

fn with_group(students: Vec<StudentRecord>, group_id: DbId) -> Vec<StudentRecord> {
    students
        .into_iter()
        .map(|student| StudentRecord {
            group_id: Some(group_id),
            ..student
        })
        .collect()
}
