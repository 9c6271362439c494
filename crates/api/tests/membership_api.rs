//! HTTP-level tests for group creation and the membership endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with_bus, delete_auth, get_auth, ids,
    patch_json_auth, post_json_auth, put_json_auth, seed_division, seed_guide, seed_students,
    token_for,
};
use projecthub_core::roles::Role;
use projecthub_core::types::DbId;
use projecthub_db::models::student::Student;
use projecthub_db::repositories::{GroupRepo, GuideRepo, StudentRepo};
use projecthub_events::EventBus;
use serde_json::json;
use sqlx::PgPool;

struct Setup {
    division_id: DbId,
    guide_id: DbId,
    guide_token: String,
    admin_token: String,
    students: Vec<Student>,
}

async fn setup(pool: &PgPool) -> Setup {
    let division = seed_division(pool, "BCA", 5, 2024).await;
    let guide = seed_guide(pool, "Dr. Mehta", "mehta@college.edu", "approved").await;
    let students = seed_students(pool, division.id, "BCA20245", 8).await;
    Setup {
        division_id: division.id,
        guide_id: guide.id,
        guide_token: token_for(Role::Guide, guide.id),
        admin_token: token_for(Role::Admin, 1),
        students,
    }
}

/// Create a group owned by the setup guide and return its id.
async fn create_group(pool: &PgPool, s: &Setup, name: &str) -> DbId {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/groups",
        &s.guide_token,
        json!({ "name": name, "division_id": s.division_id, "project_title": "Library System" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn set_members(pool: &PgPool, token: &str, group_id: DbId, members: &[DbId]) -> StatusCode {
    put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}/members"),
        token,
        json!({ "student_ids": members }),
    )
    .await
    .status()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guide_creates_own_group(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;

    let guide = GuideRepo::find_by_id(&pool, s.guide_id).await.unwrap().unwrap();
    assert_eq!(guide.assigned_group_ids, vec![group_id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_group_name_conflicts(pool: PgPool) {
    let s = setup(&pool).await;
    create_group(&pool, &s, "Team Orion").await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/groups",
        &s.guide_token,
        json!({ "name": "Team Orion", "division_id": s.division_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_must_name_guide(pool: PgPool) {
    let s = setup(&pool).await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/groups",
        &s.admin_token,
        json!({ "name": "Team Vega", "division_id": s.division_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_cannot_create_group(pool: PgPool) {
    let s = setup(&pool).await;
    let token = token_for(Role::Student, s.students[0].id);

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/groups",
        &token,
        json!({ "name": "Team Vega", "division_id": s.division_id, "guide_id": s.guide_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Replace roster
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_members_updates_both_sides(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let members = ids(&s.students[..3]);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}/members"),
        &s.guide_token,
        json!({ "student_ids": members }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let returned: Vec<i64> = json["data"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(returned, members);
    assert_eq!(json["data"]["guide"]["id"], s.guide_id);

    for id in &members {
        let student = StudentRepo::find_by_id(&pool, *id).await.unwrap().unwrap();
        assert_eq!(student.group_id, Some(group_id));
    }
    let group = GroupRepo::find_by_id(&pool, group_id).await.unwrap().unwrap();
    assert_eq!(group.members_snapshot.0.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replacing_roster_releases_dropped_students(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let first = ids(&s.students[..4]);
    let second = ids(&s.students[2..5]);

    assert_eq!(set_members(&pool, &s.guide_token, group_id, &first).await, StatusCode::OK);
    assert_eq!(set_members(&pool, &s.guide_token, group_id, &second).await, StatusCode::OK);

    let dropped = StudentRepo::find_by_id(&pool, first[0]).await.unwrap().unwrap();
    assert_eq!(dropped.group_id, None);
    let kept = StudentRepo::find_by_id(&pool, second[0]).await.unwrap().unwrap();
    assert_eq!(kept.group_id, Some(group_id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_members_rejects_five(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}/members"),
        &s.guide_token,
        json!({ "student_ids": ids(&s.students[..5]) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ROSTER_SIZE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_members_rejects_unknown_student(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let mut members = ids(&s.students[..2]);
    members.push(999_999);

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}/members"),
        &s.guide_token,
        json!({ "student_ids": members }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_members_rejects_other_division(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let other = seed_division(&pool, "MCA", 1, 2024).await;
    let outsider = seed_students(&pool, other.id, "MCA20241", 1).await;

    let mut members = ids(&s.students[..2]);
    members.push(outsider[0].id);

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}/members"),
        &s.guide_token,
        json!({ "student_ids": members }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "DIVISION_MISMATCH");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_in_another_group_conflicts(pool: PgPool) {
    let s = setup(&pool).await;
    let first = create_group(&pool, &s, "Team Orion").await;
    let second = create_group(&pool, &s, "Team Vega").await;
    assert_eq!(
        set_members(&pool, &s.guide_token, first, &ids(&s.students[..3])).await,
        StatusCode::OK
    );

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{second}/members"),
        &s.guide_token,
        json!({ "student_ids": ids(&s.students[2..5]) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "STUDENT_ALREADY_ASSIGNED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_guide_cannot_edit_roster(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let other = seed_guide(&pool, "Prof. Shah", "shah@college.edu", "approved").await;

    let status = set_members(
        &pool,
        &token_for(Role::Guide, other.id),
        group_id,
        &ids(&s.students[..3]),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_cannot_edit_roster(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;

    let status = set_members(
        &pool,
        &token_for(Role::Student, s.students[0].id),
        group_id,
        &ids(&s.students[..3]),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_member_to_three(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..3])).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}/members"),
        &s.guide_token,
        json!({ "student_ids": [s.students[3].id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["members"].as_array().unwrap().len(), 4);

    let group = GroupRepo::find_by_id(&pool, group_id).await.unwrap().unwrap();
    assert_eq!(group.student_ids, ids(&s.students[..4]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_member_to_full_group(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..4])).await;

    let response = post_json_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}/members"),
        &s.guide_token,
        json!({ "student_ids": [s.students[4].id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CAPACITY_EXCEEDED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_adds_to_group_of_three(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..3])).await;

    let uri = format!("/api/v1/groups/{group_id}/members");
    let first = post_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &s.guide_token,
        json!({ "student_ids": [s.students[3].id] }),
    );
    let second = post_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &s.guide_token,
        json!({ "student_ids": [s.students[4].id] }),
    );
    let (first, second) = tokio::join!(first, second);

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);

    let group = GroupRepo::find_by_id(&pool, group_id).await.unwrap().unwrap();
    assert_eq!(group.student_ids.len(), 4);
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_removes_member_from_four(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..4])).await;
    let leaving = s.students[1].id;

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}/members/{leaving}"),
        &s.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let student = StudentRepo::find_by_id(&pool, leaving).await.unwrap().unwrap();
    assert_eq!(student.group_id, None);
    let group = GroupRepo::find_by_id(&pool, group_id).await.unwrap().unwrap();
    assert!(!group.student_ids.contains(&leaving));
    assert!(group.members_snapshot.0.iter().all(|m| m.student_id != leaving));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_remove_below_minimum_rejected(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..3])).await;

    let response = delete_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}/members/{}", s.students[0].id),
        &s.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "MINIMUM_ROSTER_VIOLATION");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guide_cannot_remove_member(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..4])).await;

    let response = delete_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}/members/{}", s.students[0].id),
        &s.guide_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Reassign guide
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reassign_guide_moves_group_and_notifies(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let next = seed_guide(&pool, "Prof. Shah", "shah@college.edu", "approved").await;

    let bus = Arc::new(EventBus::default());
    let mut events = bus.subscribe();

    let response = patch_json_auth(
        build_test_app_with_bus(pool.clone(), Arc::clone(&bus)),
        &format!("/api/v1/groups/{group_id}/guide"),
        &s.admin_token,
        json!({ "guide_id": next.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["guide"]["id"], next.id);

    let previous = GuideRepo::find_by_id(&pool, s.guide_id).await.unwrap().unwrap();
    let current = GuideRepo::find_by_id(&pool, next.id).await.unwrap().unwrap();
    assert!(!previous.assigned_group_ids.contains(&group_id));
    assert_eq!(current.assigned_group_ids, vec![group_id]);

    let event = events.try_recv().expect("reassignment should publish an event");
    assert_eq!(event.event_type, "group.guide_reassigned");
    assert_eq!(event.recipient_email.as_deref(), Some("shah@college.edu"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reassign_to_pending_guide_rejected(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let pending = seed_guide(&pool, "Prof. Rao", "rao@college.edu", "pending").await;

    let response = patch_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}/guide"),
        &s.admin_token,
        json!({ "guide_id": pending.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_GUIDE");

    let group = GroupRepo::find_by_id(&pool, group_id).await.unwrap().unwrap();
    assert_eq!(group.guide_id, s.guide_id);
}

// ---------------------------------------------------------------------------
// Read and delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_available_students_include_excluded_group(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..3])).await;

    let free = body_json(
        get_auth(
            build_test_app(pool.clone()),
            &format!("/api/v1/divisions/{}/available-students", s.division_id),
            &s.guide_token,
        )
        .await,
    )
    .await;
    assert_eq!(free["data"].as_array().unwrap().len(), 5);

    let editable = body_json(
        get_auth(
            build_test_app(pool),
            &format!(
                "/api/v1/divisions/{}/available-students?excluding_group_id={group_id}",
                s.division_id
            ),
            &s.guide_token,
        )
        .await,
    )
    .await;
    assert_eq!(editable["data"].as_array().unwrap().len(), 8);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_sees_only_own_group(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    set_members(&pool, &s.guide_token, group_id, &ids(&s.students[..3])).await;

    let member = token_for(Role::Student, s.students[0].id);
    let outsider = token_for(Role::Student, s.students[5].id);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}"),
        &member,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}"),
        &outsider,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let listed = body_json(get_auth(build_test_app(pool), "/api/v1/groups", &member).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["id"], group_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guide_updates_project_details(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;

    let response = patch_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}"),
        &s.guide_token,
        json!({ "project_technology": "Rust", "status": "In Progress" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "In Progress");
    assert_eq!(json["data"]["project_technology"], "Rust");

    let response = patch_json_auth(
        build_test_app(pool),
        &format!("/api/v1/groups/{group_id}"),
        &s.guide_token,
        json!({ "status": "Paused" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_group_frees_members(pool: PgPool) {
    let s = setup(&pool).await;
    let group_id = create_group(&pool, &s, "Team Orion").await;
    let members = ids(&s.students[..3]);
    set_members(&pool, &s.guide_token, group_id, &members).await;

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/groups/{group_id}"),
        &s.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for id in members {
        let student = StudentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(student.group_id, None);
    }
    let guide = GuideRepo::find_by_id(&pool, s.guide_id).await.unwrap().unwrap();
    assert!(guide.assigned_group_ids.is_empty());
}
