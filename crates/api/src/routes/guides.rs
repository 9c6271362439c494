//! Route definitions for the `/guides` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::guide;
use crate::state::AppState;

/// Routes mounted at `/guides`.
///
/// ```text
/// GET   /                -> list_guides (admin)
/// POST  /register        -> register_guide (public)
/// GET   /{id}            -> get_guide
/// PATCH /{id}/review     -> review_guide (admin)
/// PATCH /{id}/active     -> toggle_guide_active (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(guide::list_guides))
        .route("/register", post(guide::register_guide))
        .route("/{id}", get(guide::get_guide))
        .route("/{id}/review", patch(guide::review_guide))
        .route("/{id}/active", patch(guide::toggle_guide_active))
}
