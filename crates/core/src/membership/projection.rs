//! Read model returned by every membership operation.

use serde::Serialize;

use crate::membership::store::{GroupRecord, GuideRecord, StudentRecord};
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideSummary {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub expertise: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub id: DbId,
    pub name: String,
    pub enrollment_number: String,
    pub email: Option<String>,
}

/// A group with its guide and live member details resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupProjection {
    pub id: DbId,
    pub name: String,
    pub division_id: DbId,
    pub year: Option<i32>,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub project_technology: Option<String>,
    pub status: String,
    pub guide: GuideSummary,
    pub members: Vec<MemberSummary>,
}

impl GroupProjection {
    /// Assemble a projection. Members are listed in roster order; roster ids
    /// with no matching entry in `students` are skipped.
    pub fn build(group: &GroupRecord, guide: &GuideRecord, students: &[StudentRecord]) -> Self {
        let members = group
            .student_ids
            .iter()
            .filter_map(|id| students.iter().find(|s| s.id == *id))
            .map(|s| MemberSummary {
                id: s.id,
                name: s.name.clone(),
                enrollment_number: s.enrollment_number.clone(),
                email: s.email.clone(),
            })
            .collect();

        Self {
            id: group.id,
            name: group.name.clone(),
            division_id: group.division_id,
            year: group.year,
            project_title: group.project_title.clone(),
            project_description: group.project_description.clone(),
            project_technology: group.project_technology.clone(),
            status: group.status.clone(),
            guide: GuideSummary {
                id: guide.id,
                name: guide.name.clone(),
                email: guide.email.clone(),
                expertise: guide.expertise.clone(),
            },
            members,
        }
    }
}
