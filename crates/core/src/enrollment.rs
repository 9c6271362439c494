//! Enrollment-number derivation and bulk generation planning.
//!
//! Enrollment numbers are `<COURSE><YEAR><SEMESTER><ROLL>` with the roll
//! zero-padded to three digits, e.g. `BCA20241007` for roll 7 of the BCA
//! semester-1 cohort of 2024.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Highest roll number representable in three digits.
pub const MAX_ROLL: u32 = 999;

static ENROLLMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(BCA|MCA|BBA|MBA|MSCIT)(20[2-3][0-9])([1-8])([0-9]{3})$")
        .expect("enrollment pattern is a valid regex")
});

/// Derive the enrollment number for a roll within a division.
pub fn enrollment_number(course: &str, year: i32, semester: i32, roll: u32) -> String {
    format!("{course}{year}{semester}{roll:03}")
}

/// Whether a string has the shape of a generated enrollment number.
pub fn is_well_formed(enrollment_number: &str) -> bool {
    ENROLLMENT_PATTERN.is_match(enrollment_number)
}

/// Validate an inclusive roll range for bulk generation.
pub fn validate_roll_range(start_roll: u32, end_roll: u32) -> Result<(), String> {
    if start_roll == 0 {
        return Err("start_roll must be at least 1".to_string());
    }
    if start_roll > end_roll {
        return Err(format!(
            "start_roll ({start_roll}) must not exceed end_roll ({end_roll})"
        ));
    }
    if end_roll > MAX_ROLL {
        return Err(format!("end_roll must not exceed {MAX_ROLL}"));
    }
    Ok(())
}

/// Result of splitting a roll range against already-existing numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentPlan {
    /// Numbers that do not exist yet, in roll order.
    pub to_create: Vec<String>,
    /// Numbers that already exist and will be reported, not created.
    pub skipped: Vec<String>,
}

/// Every enrollment number in the inclusive roll range, in roll order.
pub fn candidate_numbers(
    course: &str,
    year: i32,
    semester: i32,
    start_roll: u32,
    end_roll: u32,
) -> Vec<String> {
    (start_roll..=end_roll)
        .map(|roll| enrollment_number(course, year, semester, roll))
        .collect()
}

/// Partition candidates into those to create and those already present.
pub fn plan(candidates: Vec<String>, existing: &HashSet<String>) -> EnrollmentPlan {
    let (skipped, to_create) = candidates
        .into_iter()
        .partition(|number| existing.contains(number));
    EnrollmentPlan { to_create, skipped }
}
