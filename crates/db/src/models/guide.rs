//! Guide (faculty supervisor) model and DTOs.

use projecthub_core::membership::GuideRecord;
use projecthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full row from the `guides` table. Contains the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct Guide {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_id: String,
    pub expertise: Option<String>,
    pub password_hash: String,
    pub status: String,
    pub is_active: bool,
    pub assigned_group_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuideResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_id: String,
    pub expertise: Option<String>,
    pub status: String,
    pub is_active: bool,
    pub assigned_group_ids: Vec<DbId>,
    pub created_at: Timestamp,
}

impl From<Guide> for GuideResponse {
    fn from(g: Guide) -> Self {
        Self {
            id: g.id,
            name: g.name,
            email: g.email,
            phone: g.phone,
            employee_id: g.employee_id,
            expertise: g.expertise,
            status: g.status,
            is_active: g.is_active,
            assigned_group_ids: g.assigned_group_ids,
            created_at: g.created_at,
        }
    }
}

impl From<Guide> for GuideRecord {
    fn from(g: Guide) -> Self {
        Self {
            id: g.id,
            name: g.name,
            email: g.email,
            expertise: g.expertise,
            status: g.status,
            is_active: g.is_active,
            assigned_group_ids: g.assigned_group_ids,
        }
    }
}

/// DTO for guide self-registration. New guides start `pending` and active.
#[derive(Debug, Clone)]
pub struct CreateGuide {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_id: String,
    pub expertise: Option<String>,
    pub password_hash: String,
}
