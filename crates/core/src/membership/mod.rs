//! Group membership engine.
//!
//! The engine is the only code path that changes which students belong to
//! which group, and which guide supervises a group. It keeps three pieces
//! of state consistent with each other:
//!
//! - `Group.student_ids`, the live roster;
//! - `Student.group_id`, the back-reference on each student;
//! - `Group.members_snapshot`, the frozen identity copies for reporting.
//!
//! Every operation validates against a fresh read, then commits through a
//! [`MembershipStore`]. See [`engine`] for the commit protocol.

pub mod engine;
pub mod error;
pub mod memory;
pub mod projection;
pub mod rules;
pub mod snapshot;
pub mod store;

pub use engine::{EnrollmentReport, MembershipEngine, DEFAULT_MAX_ATTEMPTS};
pub use error::{ErrorKind, MembershipError};
pub use memory::{FailPoint, InMemoryStore};
pub use projection::{GroupProjection, GuideSummary, MemberSummary};
pub use snapshot::MemberSnapshot;
pub use store::{
    DivisionRecord, GroupRecord, GuideRecord, MembershipStore, NewGroup, NewStudent, RosterWrite,
    StoreError, StudentRecord,
};

use crate::roles::Role;
use crate::types::DbId;

/// Who is asking. Supplied by the authentication layer and trusted as-is;
/// the engine performs its own authorization against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
    pub id: DbId,
}

impl CallerIdentity {
    pub fn new(role: Role, id: DbId) -> Self {
        Self { role, id }
    }

    pub fn admin(id: DbId) -> Self {
        Self::new(Role::Admin, id)
    }

    pub fn guide(id: DbId) -> Self {
        Self::new(Role::Guide, id)
    }

    pub fn student(id: DbId) -> Self {
        Self::new(Role::Student, id)
    }
}
