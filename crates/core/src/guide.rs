//! Guide approval status constants and eligibility rules.

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

/// All valid guide status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_APPROVED, STATUS_REJECTED];

/// Event published when an admin approves a guide.
pub const EVENT_GUIDE_APPROVED: &str = "guide.approved";
/// Event published when an admin rejects a guide.
pub const EVENT_GUIDE_REJECTED: &str = "guide.rejected";

pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid guide status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

/// Validate an admin review decision. Only `approved` and `rejected` are
/// decisions; `pending` is the initial state and cannot be set by review.
pub fn validate_review_decision(status: &str) -> Result<(), String> {
    validate_status(status)?;
    if status == STATUS_PENDING {
        return Err("A review decision must be 'approved' or 'rejected'".to_string());
    }
    Ok(())
}

/// The event type published for a review decision.
pub fn review_event_type(status: &str) -> Option<&'static str> {
    match status {
        STATUS_APPROVED => Some(EVENT_GUIDE_APPROVED),
        STATUS_REJECTED => Some(EVENT_GUIDE_REJECTED),
        _ => None,
    }
}

/// Whether a guide may supervise groups and sign in.
pub fn is_assignable(status: &str, is_active: bool) -> bool {
    status == STATUS_APPROVED && is_active
}
