//! Route definitions for the `/groups` resource.

use axum::routing::{delete, get, patch, put};
use axum::Router;

use crate::handlers::group;
use crate::state::AppState;

/// Routes mounted at `/groups`.
///
/// ```text
/// GET    /                            -> list_groups
/// POST   /                            -> create_group (admin, guide)
/// GET    /{id}                        -> get_group
/// PATCH  /{id}                        -> update_group (admin, owning guide)
/// DELETE /{id}                        -> delete_group (admin)
/// PUT    /{id}/members                -> set_members (admin, owning guide)
/// POST   /{id}/members                -> add_members (admin, owning guide)
/// DELETE /{id}/members/{student_id}   -> remove_member (admin)
/// PATCH  /{id}/guide                  -> reassign_guide (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(group::list_groups).post(group::create_group))
        .route(
            "/{id}",
            get(group::get_group)
                .patch(group::update_group)
                .delete(group::delete_group),
        )
        .route(
            "/{id}/members",
            put(group::set_members).post(group::add_members),
        )
        .route("/{id}/members/{student_id}", delete(group::remove_member))
        .route("/{id}/guide", patch(group::reassign_guide))
}
