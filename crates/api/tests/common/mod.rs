#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use projecthub_api::auth::jwt::{generate_access_token, JwtConfig};
use projecthub_api::auth::password::hash_password;
use projecthub_api::config::ServerConfig;
use projecthub_api::router::build_app_router;
use projecthub_api::state::AppState;
use projecthub_core::roles::Role;
use projecthub_core::types::DbId;
use projecthub_db::models::admin::CreateAdmin;
use projecthub_db::models::division::{CreateDivision, Division};
use projecthub_db::models::guide::{CreateGuide, Guide};
use projecthub_db::models::student::{CreateStudent, RegisterStudent, Student};
use projecthub_db::repositories::{AdminRepo, DivisionRepo, GuideRepo, StudentRepo};
use projecthub_events::EventBus;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test-password-123";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        membership_max_attempts: 3,
        admin_bootstrap: None,
    }
}

/// Build the production router over `pool` with a fresh event bus.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool, Arc::new(EventBus::default()))
}

pub fn build_test_app_with_bus(pool: PgPool, event_bus: Arc<EventBus>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
    };
    build_app_router(state, &config)
}

pub fn token_for(role: Role, id: DbId) -> String {
    generate_access_token(id, role, &test_config().jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_admin(pool: &PgPool, email: &str) -> DbId {
    AdminRepo::create(
        pool,
        &CreateAdmin {
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_division(pool: &PgPool, course: &str, semester: i32, year: i32) -> Division {
    DivisionRepo::create(
        pool,
        &CreateDivision {
            course: course.to_string(),
            semester,
            year,
        },
    )
    .await
    .unwrap()
}

/// A guide with the given review status, active.
pub async fn seed_guide(pool: &PgPool, name: &str, email: &str, status: &str) -> Guide {
    let guide = GuideRepo::create(
        pool,
        &CreateGuide {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            employee_id: format!("EMP-{email}"),
            expertise: Some("Databases".to_string()),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        },
    )
    .await
    .unwrap();
    GuideRepo::set_status(pool, guide.id, status)
        .await
        .unwrap()
        .unwrap()
}

/// Unregistered students `<prefix>001..` in `division_id`.
pub async fn seed_students(
    pool: &PgPool,
    division_id: DbId,
    prefix: &str,
    count: usize,
) -> Vec<Student> {
    let mut students = Vec::with_capacity(count);
    for roll in 1..=count {
        let student = StudentRepo::create(
            pool,
            &CreateStudent {
                enrollment_number: format!("{prefix}{roll:03}"),
                division_id,
                name: Some(format!("Student {roll}")),
            },
        )
        .await
        .unwrap();
        students.push(student);
    }
    students
}

pub async fn register_student(pool: &PgPool, student_id: DbId, email: &str) -> Student {
    StudentRepo::register(
        pool,
        student_id,
        &RegisterStudent {
            name: "Registered Student".to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        },
    )
    .await
    .unwrap()
    .unwrap()
}

pub fn ids(students: &[Student]) -> Vec<DbId> {
    students.iter().map(|s| s.id).collect()
}
