//! Division (cohort) constants and validation.
//!
//! A division is identified by course, semester, and year. These checks are
//! shared by the create endpoint and by the database CHECK constraints in
//! `db/migrations`, which must stay in sync with the constants below.

/// Courses a division may be created for.
pub const VALID_COURSES: &[&str] = &["BCA", "MCA", "BBA", "MBA", "MSCIT"];

pub const MIN_SEMESTER: i32 = 1;
pub const MAX_SEMESTER: i32 = 8;

pub const MIN_YEAR: i32 = 2020;
pub const MAX_YEAR: i32 = 2035;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

/// All valid division status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE];

pub fn validate_course(course: &str) -> Result<(), String> {
    if VALID_COURSES.contains(&course) {
        Ok(())
    } else {
        Err(format!(
            "Invalid course '{course}'. Must be one of: {}",
            VALID_COURSES.join(", ")
        ))
    }
}

pub fn validate_semester(semester: i32) -> Result<(), String> {
    if (MIN_SEMESTER..=MAX_SEMESTER).contains(&semester) {
        Ok(())
    } else {
        Err(format!(
            "Semester must be between {MIN_SEMESTER} and {MAX_SEMESTER}, got {semester}"
        ))
    }
}

pub fn validate_year(year: i32) -> Result<(), String> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
        ))
    }
}

pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid division status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

/// Validate a full `(course, semester, year)` triple.
pub fn validate_division(course: &str, semester: i32, year: i32) -> Result<(), String> {
    validate_course(course)?;
    validate_semester(semester)?;
    validate_year(year)
}

/// The status a division moves to when toggled.
pub fn toggled_status(current: &str) -> &'static str {
    if current == STATUS_ACTIVE {
        STATUS_INACTIVE
    } else {
        STATUS_ACTIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_courses_accepted() {
        for course in VALID_COURSES {
            assert!(validate_course(course).is_ok());
        }
    }

    #[test]
    fn test_course_is_case_sensitive() {
        let err = validate_course("bca").unwrap_err();
        assert!(err.contains("Invalid course"));
    }

    #[test]
    fn test_semester_bounds() {
        assert!(validate_semester(1).is_ok());
        assert!(validate_semester(8).is_ok());
        assert!(validate_semester(0).is_err());
        assert!(validate_semester(9).is_err());
    }

    #[test]
    fn test_year_bounds() {
        assert!(validate_year(2020).is_ok());
        assert!(validate_year(2035).is_ok());
        assert!(validate_year(2019).is_err());
        assert!(validate_year(2036).is_err());
    }

    #[test]
    fn test_validate_division_reports_first_failure() {
        let err = validate_division("MCA", 12, 1999).unwrap_err();
        assert!(err.contains("Semester"));
    }

    #[test]
    fn test_toggle_flips_status() {
        assert_eq!(toggled_status(STATUS_ACTIVE), STATUS_INACTIVE);
        assert_eq!(toggled_status(STATUS_INACTIVE), STATUS_ACTIVE);
    }
}
