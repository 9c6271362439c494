//! ProjectHub domain core.
//!
//! Pure domain logic shared by the database and API layers: id and
//! timestamp aliases, the error taxonomy, division/guide/group rules,
//! enrollment-number derivation, and the group membership engine.
//! Nothing in this crate talks to a database directly; persistence is
//! reached through the [`membership::MembershipStore`] trait.

pub mod contact;
pub mod division;
pub mod enrollment;
pub mod error;
pub mod group;
pub mod guide;
pub mod membership;
pub mod roles;
pub mod types;
