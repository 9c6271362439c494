//! Group capacity and project status constants.

/// Smallest roster a staffed group may have.
pub const MIN_MEMBERS: usize = 3;

/// Largest roster any group may have.
pub const MAX_MEMBERS: usize = 4;

pub const STATUS_NOT_STARTED: &str = "Not Started";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_COMPLETED: &str = "Completed";
pub const STATUS_APPROVED: &str = "Approved";
pub const STATUS_REJECTED: &str = "Rejected";

pub const EVENT_MEMBERS_REPLACED: &str = "group.members_replaced";
pub const EVENT_MEMBERS_ADDED: &str = "group.members_added";
pub const EVENT_MEMBER_REMOVED: &str = "group.member_removed";
pub const EVENT_GUIDE_REASSIGNED: &str = "group.guide_reassigned";

/// All valid project status values, in workflow order.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_NOT_STARTED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_APPROVED,
    STATUS_REJECTED,
];

pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid group status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Group name must not be empty".to_string());
    }
    Ok(())
}
