pub mod auth;
pub mod division;
pub mod group;
pub mod guide;
pub mod student;
