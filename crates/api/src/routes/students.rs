//! Route definitions for the `/students` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::student;
use crate::state::AppState;

/// Routes mounted at `/students`.
///
/// ```text
/// POST   /             -> create_student (admin)
/// POST   /register     -> register_student (public)
/// GET    /{id}         -> get_student
/// DELETE /{id}         -> delete_student (admin)
/// DELETE /{id}/group   -> detach_student (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(student::create_student))
        .route("/register", post(student::register_student))
        .route(
            "/{id}",
            get(student::get_student).delete(student::delete_student),
        )
        .route("/{id}/group", delete(student::detach_student))
}
