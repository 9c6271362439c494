//! Student model and DTOs.

use projecthub_core::membership::StudentRecord;
use projecthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full row from the `students` table.
///
/// Contains the password hash once registered -- use [`StudentResponse`]
/// for API output.
#[derive(Debug, Clone, FromRow)]
pub struct Student {
    pub id: DbId,
    pub enrollment_number: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub division_id: DbId,
    pub group_id: Option<DbId>,
    pub is_registered: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentResponse {
    pub id: DbId,
    pub enrollment_number: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub division_id: DbId,
    pub group_id: Option<DbId>,
    pub is_registered: bool,
    pub created_at: Timestamp,
}

impl From<Student> for StudentResponse {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            enrollment_number: s.enrollment_number,
            name: s.name,
            email: s.email,
            phone: s.phone,
            division_id: s.division_id,
            group_id: s.group_id,
            is_registered: s.is_registered,
            created_at: s.created_at,
        }
    }
}

impl From<Student> for StudentRecord {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            enrollment_number: s.enrollment_number,
            name: s.name,
            email: s.email,
            division_id: s.division_id,
            group_id: s.group_id,
            is_registered: s.is_registered,
        }
    }
}

/// DTO for an admin-created placeholder student. Starts unregistered and
/// ungrouped.
#[derive(Debug, Clone)]
pub struct CreateStudent {
    pub enrollment_number: String,
    pub division_id: DbId,
    pub name: Option<String>,
}

/// Self-service registration details, password already hashed.
#[derive(Debug, Clone)]
pub struct RegisterStudent {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}
