//! Project group model and DTOs.

use projecthub_core::membership::{GroupRecord, MemberSnapshot};
use projecthub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Group {
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
    pub members_snapshot: Json<Vec<MemberSnapshot>>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Group> for GroupRecord {
    fn from(g: Group) -> Self {
        Self {
            id: g.id,
            name: g.name,
            guide_id: g.guide_id,
            division_id: g.division_id,
            project_title: g.project_title,
            project_description: g.project_description,
            project_technology: g.project_technology,
            year: g.year,
            status: g.status,
            student_ids: g.student_ids,
            members_snapshot: g.members_snapshot.0,
            version: g.version,
        }
    }
}

/// DTO for patching a group's descriptive fields. Membership and guide
/// are changed only through the membership engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub project_technology: Option<String>,
    pub year: Option<i32>,
    pub status: Option<String>,
}
