//! Division (course + semester + academic year cohort) model.

use projecthub_core::membership::DivisionRecord;
use projecthub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Division {
    pub id: DbId,
    pub course: String,
    pub semester: i32,
    pub year: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a division. Status starts as `active`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDivision {
    pub course: String,
    pub semester: i32,
    pub year: i32,
}

impl From<Division> for DivisionRecord {
    fn from(row: Division) -> Self {
        Self {
            id: row.id,
            course: row.course,
            semester: row.semester,
            year: row.year,
            status: row.status,
        }
    }
}
