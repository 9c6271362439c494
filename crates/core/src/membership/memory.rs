//! In-process [`MembershipStore`] used by engine tests and local tooling.
//!
//! Mirrors the conditional-update semantics of the Postgres store: version
//! compare-and-swap on group writes, guarded attach/detach on students and
//! unique enrollment numbers and group names. Individual write steps can be
//! made to fail to exercise partial-failure reporting.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::division::STATUS_ACTIVE;
use crate::group::STATUS_NOT_STARTED;
use crate::guide::STATUS_APPROVED;
use crate::membership::snapshot::MemberSnapshot;
use crate::membership::store::{
    DivisionRecord, GroupRecord, GuideRecord, MembershipStore, NewGroup, NewStudent, RosterWrite,
    StoreError, StudentRecord,
};
use crate::types::DbId;

/// A write step that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    WriteRoster,
    WriteGroupGuide,
    DetachStudents,
    AttachStudents,
    LinkGuide,
    UnlinkGuide,
    InsertStudents,
}

#[derive(Default, Clone)]
struct State {
    next_id: DbId,
    divisions: BTreeMap<DbId, DivisionRecord>,
    students: BTreeMap<DbId, StudentRecord>,
    guides: BTreeMap<DbId, GuideRecord>,
    groups: BTreeMap<DbId, GroupRecord>,
    failures: HashSet<FailPoint>,
    stale_writes: u32,
}

impl State {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.failures.contains(&point) {
            Err(StoreError::Backend(format!("injected failure at {point:?}")))
        } else {
            Ok(())
        }
    }

    /// Consume one forced compare-and-swap loss, if any are pending.
    fn take_stale_write(&mut self) -> bool {
        if self.stale_writes > 0 {
            self.stale_writes -= 1;
            true
        } else {
            false
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An independent store holding a copy of this one's current data.
    pub fn clone_state(&self) -> Self {
        Self {
            state: Mutex::new(self.lock().clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Seeding ------------------------------------------------------------

    pub fn add_division(&self, course: &str, semester: i32, year: i32) -> DivisionRecord {
        let mut state = self.lock();
        let division = DivisionRecord {
            id: state.allocate_id(),
            course: course.to_string(),
            semester,
            year,
            status: STATUS_ACTIVE.to_string(),
        };
        state.divisions.insert(division.id, division.clone());
        division
    }

    pub fn set_division_status(&self, division_id: DbId, status: &str) {
        if let Some(division) = self.lock().divisions.get_mut(&division_id) {
            division.status = status.to_string();
        }
    }

    /// Add a registered student to a division.
    pub fn add_student(
        &self,
        division_id: DbId,
        enrollment_number: &str,
        name: &str,
    ) -> StudentRecord {
        let mut state = self.lock();
        let student = StudentRecord {
            id: state.allocate_id(),
            enrollment_number: enrollment_number.to_string(),
            name: name.to_string(),
            email: Some(format!(
                "{}@students.example.edu",
                enrollment_number.to_lowercase()
            )),
            division_id,
            group_id: None,
            is_registered: true,
        };
        state.students.insert(student.id, student.clone());
        student
    }

    pub fn add_guide(&self, name: &str, status: &str, is_active: bool) -> GuideRecord {
        let mut state = self.lock();
        let id = state.allocate_id();
        let guide = GuideRecord {
            id,
            name: name.to_string(),
            email: format!("guide{id}@faculty.example.edu"),
            expertise: None,
            status: status.to_string(),
            is_active,
            assigned_group_ids: Vec::new(),
        };
        state.guides.insert(guide.id, guide.clone());
        guide
    }

    pub fn add_approved_guide(&self, name: &str) -> GuideRecord {
        self.add_guide(name, STATUS_APPROVED, true)
    }

    /// Insert a group row directly, bypassing the engine. The listed
    /// students get their back-reference set and a snapshot entry.
    pub fn add_group(
        &self,
        name: &str,
        guide_id: DbId,
        division_id: DbId,
        student_ids: &[DbId],
    ) -> GroupRecord {
        let mut state = self.lock();
        let members_snapshot = match state.divisions.get(&division_id) {
            Some(division) => student_ids
                .iter()
                .filter_map(|id| state.students.get(id))
                .map(|student| MemberSnapshot::capture(student, division, Utc::now()))
                .collect(),
            None => Vec::new(),
        };
        let group = GroupRecord {
            id: state.allocate_id(),
            name: name.to_string(),
            guide_id,
            division_id,
            project_title: None,
            project_description: None,
            project_technology: None,
            year: None,
            status: STATUS_NOT_STARTED.to_string(),
            student_ids: student_ids.to_vec(),
            members_snapshot,
            version: 0,
        };
        for id in student_ids {
            if let Some(student) = state.students.get_mut(id) {
                student.group_id = Some(group.id);
            }
        }
        if let Some(guide) = state.guides.get_mut(&guide_id) {
            guide.assigned_group_ids.push(group.id);
        }
        state.groups.insert(group.id, group.clone());
        group
    }

    // -- Inspection ---------------------------------------------------------

    pub fn group(&self, id: DbId) -> Option<GroupRecord> {
        self.lock().groups.get(&id).cloned()
    }

    pub fn student(&self, id: DbId) -> Option<StudentRecord> {
        self.lock().students.get(&id).cloned()
    }

    pub fn guide(&self, id: DbId) -> Option<GuideRecord> {
        self.lock().guides.get(&id).cloned()
    }

    pub fn students_in_division(&self, division_id: DbId) -> Vec<StudentRecord> {
        self.lock()
            .students
            .values()
            .filter(|s| s.division_id == division_id)
            .cloned()
            .collect()
    }

    // -- Fault injection ----------------------------------------------------

    pub fn fail_at(&self, point: FailPoint) {
        self.lock().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Make the next `count` compare-and-swap writes lose as if another
    /// writer had bumped the version first.
    pub fn lose_next_writes(&self, count: u32) {
        self.lock().stale_writes = count;
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn find_group(&self, id: DbId) -> Result<Option<GroupRecord>, StoreError> {
        Ok(self.lock().groups.get(&id).cloned())
    }

    async fn find_division(&self, id: DbId) -> Result<Option<DivisionRecord>, StoreError> {
        Ok(self.lock().divisions.get(&id).cloned())
    }

    async fn find_guide(&self, id: DbId) -> Result<Option<GuideRecord>, StoreError> {
        Ok(self.lock().guides.get(&id).cloned())
    }

    async fn find_students(&self, ids: &[DbId]) -> Result<Vec<StudentRecord>, StoreError> {
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.students.get(id).cloned())
            .collect())
    }

    async fn list_available_students(
        &self,
        division_id: DbId,
        excluding_group_id: Option<DbId>,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let state = self.lock();
        Ok(state
            .students
            .values()
            .filter(|s| s.division_id == division_id)
            .filter(|s| s.group_id.is_none() || s.group_id == excluding_group_id)
            .cloned()
            .collect())
    }

    async fn existing_enrollment_numbers(
        &self,
        candidates: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let state = self.lock();
        Ok(state
            .students
            .values()
            .filter(|s| candidates.contains(&s.enrollment_number))
            .map(|s| s.enrollment_number.clone())
            .collect())
    }

    async fn insert_students(&self, students: &[NewStudent]) -> Result<Vec<String>, StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::InsertStudents)?;

        let mut taken: HashSet<String> = state
            .students
            .values()
            .map(|s| s.enrollment_number.clone())
            .collect();
        let mut inserted = Vec::new();
        for new in students {
            if !taken.insert(new.enrollment_number.clone()) {
                continue;
            }
            let student = StudentRecord {
                id: state.allocate_id(),
                enrollment_number: new.enrollment_number.clone(),
                name: String::new(),
                email: None,
                division_id: new.division_id,
                group_id: None,
                is_registered: false,
            };
            state.students.insert(student.id, student);
            inserted.push(new.enrollment_number.clone());
        }
        Ok(inserted)
    }

    async fn insert_group(&self, input: &NewGroup) -> Result<GroupRecord, StoreError> {
        let mut state = self.lock();
        if state.groups.values().any(|g| g.name == input.name) {
            return Err(StoreError::Conflict(format!(
                "A group named '{}' already exists",
                input.name
            )));
        }
        let group = GroupRecord {
            id: state.allocate_id(),
            name: input.name.clone(),
            guide_id: input.guide_id,
            division_id: input.division_id,
            project_title: input.project_title.clone(),
            project_description: input.project_description.clone(),
            project_technology: input.project_technology.clone(),
            year: input.year,
            status: STATUS_NOT_STARTED.to_string(),
            student_ids: Vec::new(),
            members_snapshot: Vec::new(),
            version: 0,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete_group(&self, group_id: DbId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.groups.remove(&group_id).is_none() {
            return Ok(false);
        }
        for student in state.students.values_mut() {
            if student.group_id == Some(group_id) {
                student.group_id = None;
            }
        }
        Ok(true)
    }

    async fn write_roster(&self, write: RosterWrite<'_>) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::WriteRoster)?;
        if state.take_stale_write() {
            return Ok(false);
        }
        match state.groups.get_mut(&write.group_id) {
            Some(group) if group.version == write.expected_version => {
                group.student_ids = write.student_ids.to_vec();
                group.members_snapshot = write.snapshot.to_vec();
                group.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn write_group_guide(
        &self,
        group_id: DbId,
        expected_version: i32,
        guide_id: DbId,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::WriteGroupGuide)?;
        if state.take_stale_write() {
            return Ok(false);
        }
        match state.groups.get_mut(&group_id) {
            Some(group) if group.version == expected_version => {
                group.guide_id = guide_id;
                group.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn detach_students(
        &self,
        group_id: DbId,
        student_ids: &[DbId],
    ) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::DetachStudents)?;
        let mut changed = 0;
        for id in student_ids {
            if let Some(student) = state.students.get_mut(id) {
                if student.group_id == Some(group_id) {
                    student.group_id = None;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn attach_students(
        &self,
        group_id: DbId,
        student_ids: &[DbId],
    ) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::AttachStudents)?;
        let mut matched = 0;
        for id in student_ids {
            if let Some(student) = state.students.get_mut(id) {
                if student.group_id.is_none() || student.group_id == Some(group_id) {
                    student.group_id = Some(group_id);
                    matched += 1;
                }
            }
        }
        Ok(matched)
    }

    async fn link_guide_group(&self, guide_id: DbId, group_id: DbId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::LinkGuide)?;
        if let Some(guide) = state.guides.get_mut(&guide_id) {
            if !guide.assigned_group_ids.contains(&group_id) {
                guide.assigned_group_ids.push(group_id);
            }
        }
        Ok(())
    }

    async fn unlink_guide_group(&self, guide_id: DbId, group_id: DbId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(FailPoint::UnlinkGuide)?;
        if let Some(guide) = state.guides.get_mut(&guide_id) {
            guide.assigned_group_ids.retain(|id| *id != group_id);
        }
        Ok(())
    }
}
