//! Route definitions for the `/divisions` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::division;
use crate::state::AppState;

/// Routes mounted at `/divisions`.
///
/// ```text
/// GET    /                              -> list_divisions
/// POST   /                              -> create_division
/// GET    /{id}                          -> get_division
/// DELETE /{id}                          -> delete_division
/// PATCH  /{id}/status                   -> toggle_division_status
/// GET    /{id}/students                 -> list_division_students
/// DELETE /{id}/students                 -> delete_division_students
/// GET    /{id}/available-students       -> available_students
/// POST   /{id}/enrollments              -> generate_enrollments
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(division::list_divisions).post(division::create_division),
        )
        .route(
            "/{id}",
            get(division::get_division).delete(division::delete_division),
        )
        .route("/{id}/status", patch(division::toggle_division_status))
        .route(
            "/{id}/students",
            get(division::list_division_students).delete(division::delete_division_students),
        )
        .route("/{id}/available-students", get(division::available_students))
        .route("/{id}/enrollments", post(division::generate_enrollments))
}
