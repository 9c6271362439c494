//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the table,
//! a create DTO and, where the table is patched, an update DTO. Rows that
//! carry a password hash are never serialized directly; use the matching
//! `...Response` type.

pub mod admin;
pub mod division;
pub mod group;
pub mod guide;
pub mod student;
