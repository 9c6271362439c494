//! Pure validation rules applied before any membership write.

use std::collections::HashSet;

use crate::group::{MAX_MEMBERS, MIN_MEMBERS};
use crate::guide;
use crate::membership::error::MembershipError;
use crate::membership::store::{GroupRecord, GuideRecord, StudentRecord};
use crate::membership::CallerIdentity;
use crate::roles::Role;
use crate::types::DbId;

/// Admins may edit any group; a guide only the groups it supervises.
pub fn authorize_group_edit(
    caller: &CallerIdentity,
    group: &GroupRecord,
) -> Result<(), MembershipError> {
    match caller.role {
        Role::Admin => Ok(()),
        Role::Guide if group.guide_id == caller.id => Ok(()),
        Role::Guide => Err(MembershipError::Forbidden(format!(
            "Guide {} does not supervise group {}",
            caller.id, group.id
        ))),
        Role::Student => Err(MembershipError::Forbidden(
            "Students cannot modify group membership".to_string(),
        )),
    }
}

pub fn authorize_admin(caller: &CallerIdentity, action: &str) -> Result<(), MembershipError> {
    if caller.role == Role::Admin {
        Ok(())
    } else {
        Err(MembershipError::Forbidden(format!(
            "Admin role required to {action}"
        )))
    }
}

/// A full roster must hold between [`MIN_MEMBERS`] and [`MAX_MEMBERS`] ids.
pub fn validate_roster_size(size: usize) -> Result<(), MembershipError> {
    if (MIN_MEMBERS..=MAX_MEMBERS).contains(&size) {
        Ok(())
    } else {
        Err(MembershipError::InvalidRosterSize {
            size,
            min: MIN_MEMBERS,
            max: MAX_MEMBERS,
        })
    }
}

/// Reject the first id that appears twice.
pub fn ensure_unique(ids: &[DbId]) -> Result<(), MembershipError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(MembershipError::DuplicateMember(*id));
        }
    }
    Ok(())
}

/// Reject ids that are already on the roster.
pub fn ensure_not_members(group: &GroupRecord, ids: &[DbId]) -> Result<(), MembershipError> {
    match ids.iter().find(|id| group.student_ids.contains(id)) {
        Some(id) => Err(MembershipError::DuplicateMember(*id)),
        None => Ok(()),
    }
}

/// Order `found` to match `ids`, failing on the first id with no record.
pub fn resolve_in_order(
    ids: &[DbId],
    mut found: Vec<StudentRecord>,
) -> Result<Vec<StudentRecord>, MembershipError> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let position = found
            .iter()
            .position(|s| s.id == *id)
            .ok_or(MembershipError::StudentNotFound(*id))?;
        resolved.push(found.swap_remove(position));
    }
    Ok(resolved)
}

pub fn ensure_same_division(
    group: &GroupRecord,
    students: &[StudentRecord],
) -> Result<(), MembershipError> {
    match students.iter().find(|s| s.division_id != group.division_id) {
        Some(s) => Err(MembershipError::DivisionMismatch {
            student_id: s.id,
            student_division_id: s.division_id,
            group_division_id: group.division_id,
        }),
        None => Ok(()),
    }
}

/// No student may currently belong to a different group. Transfers are
/// never resolved implicitly; the caller must detach first.
pub fn ensure_not_assigned_elsewhere(
    group_id: DbId,
    students: &[StudentRecord],
) -> Result<(), MembershipError> {
    for student in students {
        if let Some(other) = student.group_id {
            if other != group_id {
                return Err(MembershipError::StudentAlreadyAssigned {
                    student_id: student.id,
                    other_group_id: other,
                });
            }
        }
    }
    Ok(())
}

pub fn ensure_capacity(current: usize, requested: usize) -> Result<(), MembershipError> {
    if current + requested > MAX_MEMBERS {
        return Err(MembershipError::CapacityExceeded {
            current,
            requested,
            max: MAX_MEMBERS,
        });
    }
    Ok(())
}

/// Single-member removal keeps at least [`MIN_MEMBERS`] on the roster.
pub fn ensure_floor_after_removal(current: usize) -> Result<(), MembershipError> {
    let remaining = current.saturating_sub(1);
    if remaining < MIN_MEMBERS {
        return Err(MembershipError::MinimumRosterViolation {
            remaining,
            min: MIN_MEMBERS,
        });
    }
    Ok(())
}

pub fn ensure_assignable_guide(guide: &GuideRecord) -> Result<(), MembershipError> {
    if guide::is_assignable(&guide.status, guide.is_active) {
        Ok(())
    } else {
        Err(MembershipError::InvalidGuide(guide.id))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn group(guide_id: DbId, student_ids: Vec<DbId>) -> GroupRecord {
        GroupRecord {
            id: 10,
            name: "Team".into(),
            guide_id,
            division_id: 1,
            project_title: None,
            project_description: None,
            project_technology: None,
            year: Some(2024),
            status: "Not Started".into(),
            student_ids,
            members_snapshot: Vec::new(),
            version: 0,
        }
    }

    fn student(id: DbId, division_id: DbId, group_id: Option<DbId>) -> StudentRecord {
        StudentRecord {
            id,
            enrollment_number: format!("BCA20241{id:03}"),
            name: format!("Student {id}"),
            email: None,
            division_id,
            group_id,
            is_registered: false,
        }
    }

    #[test]
    fn test_roster_size_bounds() {
        assert_matches!(
            validate_roster_size(2),
            Err(MembershipError::InvalidRosterSize { size: 2, .. })
        );
        assert!(validate_roster_size(3).is_ok());
        assert!(validate_roster_size(4).is_ok());
        assert_matches!(
            validate_roster_size(5),
            Err(MembershipError::InvalidRosterSize { size: 5, .. })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        assert_matches!(
            ensure_unique(&[1, 2, 1]),
            Err(MembershipError::DuplicateMember(1))
        );
        assert!(ensure_unique(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn test_resolve_reports_missing_id() {
        let found = vec![student(1, 1, None), student(3, 1, None)];
        assert_matches!(
            resolve_in_order(&[1, 2, 3], found),
            Err(MembershipError::StudentNotFound(2))
        );
    }

    #[test]
    fn test_resolve_preserves_request_order() {
        let found = vec![student(3, 1, None), student(1, 1, None), student(2, 1, None)];
        let resolved = resolve_in_order(&[1, 2, 3], found).unwrap();
        let ids: Vec<_> = resolved.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_division_mismatch_detected() {
        let g = group(5, vec![]);
        let students = vec![student(1, 1, None), student(2, 9, None)];
        assert_matches!(
            ensure_same_division(&g, &students),
            Err(MembershipError::DivisionMismatch {
                student_id: 2,
                student_division_id: 9,
                group_division_id: 1
            })
        );
    }

    #[test]
    fn test_members_of_this_group_are_not_conflicts() {
        let students = vec![student(1, 1, Some(10)), student(2, 1, None)];
        assert!(ensure_not_assigned_elsewhere(10, &students).is_ok());

        let students = vec![student(1, 1, Some(11))];
        assert_matches!(
            ensure_not_assigned_elsewhere(10, &students),
            Err(MembershipError::StudentAlreadyAssigned {
                student_id: 1,
                other_group_id: 11
            })
        );
    }

    #[test]
    fn test_capacity_and_floor() {
        assert!(ensure_capacity(2, 2).is_ok());
        assert_matches!(
            ensure_capacity(3, 2),
            Err(MembershipError::CapacityExceeded { current: 3, requested: 2, max: 4 })
        );
        assert!(ensure_floor_after_removal(4).is_ok());
        assert_matches!(
            ensure_floor_after_removal(3),
            Err(MembershipError::MinimumRosterViolation { remaining: 2, min: 3 })
        );
    }

    #[test]
    fn test_guide_authorization() {
        let g = group(5, vec![]);
        assert!(authorize_group_edit(&CallerIdentity::admin(1), &g).is_ok());
        assert!(authorize_group_edit(&CallerIdentity::guide(5), &g).is_ok());
        assert_matches!(
            authorize_group_edit(&CallerIdentity::guide(6), &g),
            Err(MembershipError::Forbidden(_))
        );
        assert_matches!(
            authorize_group_edit(&CallerIdentity::student(5), &g),
            Err(MembershipError::Forbidden(_))
        );
    }
}
