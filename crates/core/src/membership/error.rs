//! Membership engine error taxonomy.

use crate::membership::store::StoreError;
use crate::types::DbId;

/// Broad class of a [`MembershipError`], used by the API layer to pick an
/// HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Forbidden,
    PartialFailure,
    Server,
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("Group {0} not found")]
    GroupNotFound(DbId),

    #[error("Student {0} not found")]
    StudentNotFound(DbId),

    #[error("Guide {0} not found")]
    GuideNotFound(DbId),

    #[error("Division {0} not found")]
    DivisionNotFound(DbId),

    #[error("Student {student_id} is not a member of group {group_id}")]
    NotAMember { group_id: DbId, student_id: DbId },

    #[error("A group roster must have between {min} and {max} members, got {size}")]
    InvalidRosterSize { size: usize, min: usize, max: usize },

    #[error("At least one student id is required")]
    EmptyMemberList,

    #[error("Student {0} is listed more than once or is already a member")]
    DuplicateMember(DbId),

    #[error(
        "Student {student_id} belongs to division {student_division_id}, \
         but the group is in division {group_division_id}"
    )]
    DivisionMismatch {
        student_id: DbId,
        student_division_id: DbId,
        group_division_id: DbId,
    },

    #[error("Student {student_id} is already assigned to group {other_group_id}")]
    StudentAlreadyAssigned { student_id: DbId, other_group_id: DbId },

    #[error("Adding {requested} students to a group of {current} would exceed the limit of {max}")]
    CapacityExceeded {
        current: usize,
        requested: usize,
        max: usize,
    },

    #[error("Removing a member would leave {remaining} students, below the minimum of {min}")]
    MinimumRosterViolation { remaining: usize, min: usize },

    #[error("Guide {0} is not approved and active")]
    InvalidGuide(DbId),

    #[error("Division {0} is inactive")]
    InactiveDivision(DbId),

    #[error("Invalid roll range: {0}")]
    InvalidRollRange(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Group {0} was modified concurrently, re-read and retry")]
    ConcurrentModification(DbId),

    /// A write failed after earlier writes of the same operation were
    /// persisted. Nothing is rolled back; `committed` names what landed.
    #[error("Step '{step}' failed after committing {committed:?}: {reason}")]
    PartialFailure {
        step: &'static str,
        committed: Vec<&'static str>,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MembershipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GroupNotFound(_)
            | Self::StudentNotFound(_)
            | Self::GuideNotFound(_)
            | Self::DivisionNotFound(_)
            | Self::NotAMember { .. } => ErrorKind::NotFound,
            Self::InvalidRosterSize { .. }
            | Self::EmptyMemberList
            | Self::DuplicateMember(_)
            | Self::DivisionMismatch { .. }
            | Self::CapacityExceeded { .. }
            | Self::MinimumRosterViolation { .. }
            | Self::InvalidGuide(_)
            | Self::InactiveDivision(_)
            | Self::InvalidRollRange(_)
            | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::StudentAlreadyAssigned { .. }
            | Self::ConcurrentModification(_)
            | Self::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::PartialFailure { .. } => ErrorKind::PartialFailure,
            Self::Store(StoreError::Backend(_)) => ErrorKind::Server,
        }
    }

    /// Stable machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GroupNotFound(_)
            | Self::StudentNotFound(_)
            | Self::GuideNotFound(_)
            | Self::DivisionNotFound(_)
            | Self::NotAMember { .. } => "NOT_FOUND",
            Self::InvalidRosterSize { .. } => "INVALID_ROSTER_SIZE",
            Self::EmptyMemberList => "EMPTY_MEMBER_LIST",
            Self::DuplicateMember(_) => "DUPLICATE_MEMBER",
            Self::DivisionMismatch { .. } => "DIVISION_MISMATCH",
            Self::StudentAlreadyAssigned { .. } => "STUDENT_ALREADY_ASSIGNED",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::MinimumRosterViolation { .. } => "MINIMUM_ROSTER_VIOLATION",
            Self::InvalidGuide(_) => "INVALID_GUIDE",
            Self::InactiveDivision(_) => "INACTIVE_DIVISION",
            Self::InvalidRollRange(_) => "INVALID_ROLL_RANGE",
            Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::PartialFailure { .. } => "PARTIAL_FAILURE",
            Self::Store(StoreError::Conflict(_)) => "CONFLICT",
            Self::Store(StoreError::Backend(_)) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_violations_are_validation_errors() {
        let err = MembershipError::InvalidRosterSize {
            size: 5,
            min: 3,
            max: 4,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "INVALID_ROSTER_SIZE");
        assert!(err.to_string().contains("got 5"));
    }

    #[test]
    fn test_already_assigned_is_conflict() {
        let err = MembershipError::StudentAlreadyAssigned {
            student_id: 1,
            other_group_id: 2,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_store_errors_split_by_cause() {
        let conflict = MembershipError::from(StoreError::Conflict("name taken".into()));
        let backend = MembershipError::from(StoreError::Backend("connection reset".into()));
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(backend.kind(), ErrorKind::Server);
    }
}
