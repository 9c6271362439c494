//! Query parameter types shared across handler modules.

use projecthub_core::types::DbId;
use serde::Deserialize;

/// `?status=` filter for divisions and guides.
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// `?division_id=` filter for the admin group listing.
#[derive(Debug, Deserialize)]
pub struct GroupListParams {
    pub division_id: Option<DbId>,
}

/// `?excluding_group_id=` for the available-students picker. Members of that
/// group are listed alongside the unassigned students so an edit form can
/// show the current roster as selectable.
#[derive(Debug, Deserialize)]
pub struct AvailableStudentsParams {
    pub excluding_group_id: Option<DbId>,
}
