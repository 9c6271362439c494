//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod admin_repo;
pub mod division_repo;
pub mod group_repo;
pub mod guide_repo;
pub mod student_repo;

pub use admin_repo::AdminRepo;
pub use division_repo::DivisionRepo;
pub use group_repo::GroupRepo;
pub use guide_repo::GuideRepo;
pub use student_repo::StudentRepo;
