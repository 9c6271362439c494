pub mod auth;
pub mod divisions;
pub mod groups;
pub mod guides;
pub mod health;
pub mod students;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/me                                     current profile
///
/// /divisions                                   list, create (admin)
/// /divisions/{id}                              get, delete (admin)
/// /divisions/{id}/status                       toggle active/inactive (admin)
/// /divisions/{id}/students                     list, bulk delete (admin)
/// /divisions/{id}/available-students           roster picker
/// /divisions/{id}/enrollments                  generate roll range (admin)
///
/// /students                                    create (admin)
/// /students/register                           self-registration (public)
/// /students/{id}                               get, delete (admin)
///
/// /guides                                      list (admin)
/// /guides/register                             self-registration (public)
/// /guides/{id}                                 get
/// /guides/{id}/review                          approve / reject (admin)
/// /guides/{id}/active                          toggle active (admin)
///
/// /groups                                      list, create
/// /groups/{id}                                 get, update, delete (admin)
/// /groups/{id}/members                         replace (PUT), add (POST)
/// /groups/{id}/members/{student_id}            remove (admin)
/// /groups/{id}/guide                           reassign (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/divisions", divisions::router())
        .nest("/students", students::router())
        .nest("/guides", guides::router())
        .nest("/groups", groups::router())
}
