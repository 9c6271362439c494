//! Denormalized member snapshots.
//!
//! A [`MemberSnapshot`] is a value copy of a student's identity taken when
//! the student joins a roster (or when the roster is replaced). It is never
//! refreshed from the live student row afterwards, so reports keep showing
//! who was on the team at the time even if the student is later renamed.

use serde::{Deserialize, Serialize};

use crate::membership::store::{DivisionRecord, StudentRecord};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub student_id: DbId,
    pub enrollment_number: String,
    pub name: String,
    pub joined_at: Timestamp,
    pub division_course: String,
    pub division_semester: i32,
}

impl MemberSnapshot {
    pub fn capture(
        student: &StudentRecord,
        division: &DivisionRecord,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            student_id: student.id,
            enrollment_number: student.enrollment_number.clone(),
            name: student.name.clone(),
            joined_at,
            division_course: division.course.clone(),
            division_semester: division.semester,
        }
    }
}

/// Build a fresh snapshot for a replaced roster.
///
/// Identity fields come from `students` as read for this commit. Members
/// that were already on `previous` keep their original `joined_at`.
pub fn rebuild(
    students: &[StudentRecord],
    division: &DivisionRecord,
    previous: &[MemberSnapshot],
    now: Timestamp,
) -> Vec<MemberSnapshot> {
    students
        .iter()
        .map(|student| {
            let joined_at = previous
                .iter()
                .find(|entry| entry.student_id == student.id)
                .map_or(now, |entry| entry.joined_at);
            MemberSnapshot::capture(student, division, joined_at)
        })
        .collect()
}

/// Append entries for newly added students to an existing snapshot.
pub fn append(
    previous: &[MemberSnapshot],
    added: &[StudentRecord],
    division: &DivisionRecord,
    now: Timestamp,
) -> Vec<MemberSnapshot> {
    let mut next = previous.to_vec();
    next.extend(
        added
            .iter()
            .map(|student| MemberSnapshot::capture(student, division, now)),
    );
    next
}

/// Drop the entry for `student_id`, leaving every other entry untouched.
pub fn without(previous: &[MemberSnapshot], student_id: DbId) -> Vec<MemberSnapshot> {
    previous
        .iter()
        .filter(|entry| entry.student_id != student_id)
        .cloned()
        .collect()
}
