//! Integration tests for the repository layer against a real database.
//!
//! - Division cohort uniqueness and reference counting
//! - Student registration and bulk enrollment inserts
//! - Guide assignment list maintenance
//! - Group compare-and-swap writes and deletion

use assert_matches::assert_matches;
use projecthub_core::membership::NewGroup;
use projecthub_db::models::division::CreateDivision;
use projecthub_db::models::guide::CreateGuide;
use projecthub_db::models::student::{CreateStudent, RegisterStudent};
use projecthub_db::repositories::{DivisionRepo, GroupRepo, GuideRepo, StudentRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bca_2024() -> CreateDivision {
    CreateDivision {
        course: "BCA".to_string(),
        semester: 1,
        year: 2024,
    }
}

fn new_guide(email: &str, employee_id: &str) -> CreateGuide {
    CreateGuide {
        name: "Dr. Mehta".to_string(),
        email: email.to_string(),
        phone: None,
        employee_id: employee_id.to_string(),
        expertise: Some("Databases".to_string()),
        password_hash: "$argon2id$placeholder".to_string(),
    }
}

fn new_group(name: &str, guide_id: i64, division_id: i64) -> NewGroup {
    NewGroup {
        name: name.to_string(),
        guide_id,
        division_id,
        project_title: None,
        project_description: None,
        project_technology: None,
        year: Some(2024),
    }
}

fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            db.constraint().map(str::to_string)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Divisions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_division_violates_unique_cohort(pool: PgPool) {
    DivisionRepo::create(&pool, &bca_2024()).await.unwrap();

    let err = DivisionRepo::create(&pool, &bca_2024()).await.unwrap_err();
    assert_eq!(
        unique_violation(&err).as_deref(),
        Some("uq_divisions_course_semester_year")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_division_list_filters_by_status(pool: PgPool) {
    let active = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    let other = DivisionRepo::create(
        &pool,
        &CreateDivision {
            course: "MCA".to_string(),
            semester: 3,
            year: 2025,
        },
    )
    .await
    .unwrap();
    DivisionRepo::set_status(&pool, other.id, "inactive")
        .await
        .unwrap();

    let listed = DivisionRepo::list(&pool, Some("active")).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, active.id);
    assert_eq!(DivisionRepo::list(&pool, None).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_division_reference_counts(pool: PgPool) {
    let division = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    StudentRepo::create(
        &pool,
        &CreateStudent {
            enrollment_number: "BCA20241001".to_string(),
            division_id: division.id,
            name: None,
        },
    )
    .await
    .unwrap();

    let (students, groups) = DivisionRepo::count_references(&pool, division.id)
        .await
        .unwrap();
    assert_eq!((students, groups), (1, 0));
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_insert_skips_existing_numbers(pool: PgPool) {
    let division = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    let numbers: Vec<String> = (1..=3).map(|r| format!("BCA2024100{r}")).collect();
    let divisions = vec![division.id; numbers.len()];

    let first = StudentRepo::create_many_unregistered(&pool, &numbers, &divisions)
        .await
        .unwrap();
    let second = StudentRepo::create_many_unregistered(&pool, &numbers, &divisions)
        .await
        .unwrap();

    assert_eq!(first.len(), 3);
    assert!(second.is_empty());
    let existing = StudentRepo::existing_enrollment_numbers(&pool, &numbers)
        .await
        .unwrap();
    assert_eq!(existing.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_registration_only_applies_once(pool: PgPool) {
    let division = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    let student = StudentRepo::create(
        &pool,
        &CreateStudent {
            enrollment_number: "BCA20241001".to_string(),
            division_id: division.id,
            name: None,
        },
    )
    .await
    .unwrap();
    assert!(!student.is_registered);

    let details = RegisterStudent {
        name: "Asha Patel".to_string(),
        email: "asha@example.edu".to_string(),
        phone: "9876543210".to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    };
    let registered = StudentRepo::register(&pool, student.id, &details)
        .await
        .unwrap()
        .expect("first registration should match");
    assert!(registered.is_registered);
    assert_eq!(registered.name, "Asha Patel");

    let again = StudentRepo::register(&pool, student.id, &details).await.unwrap();
    assert!(again.is_none());
}

// ---------------------------------------------------------------------------
// Guides
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guide_defaults_and_link_is_idempotent(pool: PgPool) {
    let guide = GuideRepo::create(&pool, &new_guide("mehta@example.edu", "EMP-1"))
        .await
        .unwrap();
    assert_eq!(guide.status, "pending");
    assert!(guide.is_active);
    assert!(guide.assigned_group_ids.is_empty());

    GuideRepo::link_group(&pool, guide.id, 42).await.unwrap();
    GuideRepo::link_group(&pool, guide.id, 42).await.unwrap();
    let linked = GuideRepo::find_by_id(&pool, guide.id).await.unwrap().unwrap();
    assert_eq!(linked.assigned_group_ids, vec![42]);

    GuideRepo::unlink_group(&pool, guide.id, 42).await.unwrap();
    let unlinked = GuideRepo::find_by_id(&pool, guide.id).await.unwrap().unwrap();
    assert!(unlinked.assigned_group_ids.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_guide_email_rejected(pool: PgPool) {
    GuideRepo::create(&pool, &new_guide("mehta@example.edu", "EMP-1"))
        .await
        .unwrap();
    let err = GuideRepo::create(&pool, &new_guide("mehta@example.edu", "EMP-2"))
        .await
        .unwrap_err();
    assert_eq!(unique_violation(&err).as_deref(), Some("uq_guides_email"));
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_roster_write_is_compare_and_swap(pool: PgPool) {
    let division = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    let guide = GuideRepo::create(&pool, &new_guide("mehta@example.edu", "EMP-1"))
        .await
        .unwrap();
    let group = GroupRepo::create(&pool, &new_group("Team Alpha", guide.id, division.id))
        .await
        .unwrap();
    assert_eq!(group.version, 0);

    let won = GroupRepo::write_roster(&pool, group.id, 0, &[1, 2, 3], &[])
        .await
        .unwrap();
    let lost = GroupRepo::write_roster(&pool, group.id, 0, &[4, 5, 6], &[])
        .await
        .unwrap();

    assert!(won);
    assert!(!lost);
    let stored = GroupRepo::find_by_id(&pool, group.id).await.unwrap().unwrap();
    assert_eq!(stored.student_ids, vec![1, 2, 3]);
    assert_eq!(stored.version, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_roster_above_four_rejected_by_schema(pool: PgPool) {
    let division = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    let guide = GuideRepo::create(&pool, &new_guide("mehta@example.edu", "EMP-1"))
        .await
        .unwrap();
    let group = GroupRepo::create(&pool, &new_group("Team Alpha", guide.id, division.id))
        .await
        .unwrap();

    let result = GroupRepo::write_roster(&pool, group.id, 0, &[1, 2, 3, 4, 5], &[]).await;
    assert_matches!(result, Err(sqlx::Error::Database(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_group_delete_clears_back_references(pool: PgPool) {
    let division = DivisionRepo::create(&pool, &bca_2024()).await.unwrap();
    let guide = GuideRepo::create(&pool, &new_guide("mehta@example.edu", "EMP-1"))
        .await
        .unwrap();
    let group = GroupRepo::create(&pool, &new_group("Team Alpha", guide.id, division.id))
        .await
        .unwrap();
    let student = StudentRepo::create(
        &pool,
        &CreateStudent {
            enrollment_number: "BCA20241001".to_string(),
            division_id: division.id,
            name: Some("Asha".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(StudentRepo::attach(&pool, group.id, &[student.id]).await.unwrap(), 1);

    assert!(GroupRepo::delete(&pool, group.id).await.unwrap());

    let reloaded = StudentRepo::find_by_id(&pool, student.id).await.unwrap().unwrap();
    assert_eq!(reloaded.group_id, None);
    assert!(!GroupRepo::delete(&pool, group.id).await.unwrap());
}
