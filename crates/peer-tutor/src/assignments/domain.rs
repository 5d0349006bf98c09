use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned identifier for a registered peer tutor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorId(pub i64);

/// Catalog key for a course, e.g. `CS101`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(pub String);

impl CourseCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name pair used to look a tutor up. Matching is exact; collation is left to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TutorName {
    pub first_name: String,
    pub last_name: String,
}

impl TutorName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl fmt::Display for TutorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Registered tutor as returned by roster lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: TutorId,
    pub first_name: String,
    pub last_name: String,
}

impl Tutor {
    pub fn name(&self) -> TutorName {
        TutorName::new(self.first_name.clone(), self.last_name.clone())
    }
}

/// Letter grade exactly as recorded, e.g. `A-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LetterGrade(pub String);

impl LetterGrade {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The (tutor, course) combination being evaluated for assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub tutor: TutorName,
    pub course: CourseCode,
}

/// Raw fields supplied by a caller before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub first_name: String,
    pub last_name: String,
    pub course_code: String,
}

impl AssignmentRequest {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        course_code: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            course_code: course_code.into(),
        }
    }

    /// Trim every field and build the candidate pair, naming the first blank field.
    pub fn candidate(&self) -> Result<CandidatePair, MissingField> {
        let first_name = required(&self.first_name, MissingField::FirstName)?;
        let last_name = required(&self.last_name, MissingField::LastName)?;
        let course_code = required(&self.course_code, MissingField::CourseCode)?;

        Ok(CandidatePair {
            tutor: TutorName::new(first_name, last_name),
            course: CourseCode(course_code),
        })
    }
}

fn required(value: &str, field: MissingField) -> Result<String, MissingField> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(field)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Input field left blank by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissingField {
    #[error("first name is required")]
    FirstName,
    #[error("last name is required")]
    LastName,
    #[error("course code is required")]
    CourseCode,
}

/// Tutors assigned to a course, read back after a commit or on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub course_code: CourseCode,
    pub tutors: Vec<Tutor>,
}

impl RosterSnapshot {
    pub fn contains(&self, name: &TutorName) -> bool {
        self.tutors.iter().any(|tutor| {
            tutor.first_name == name.first_name && tutor.last_name == name.last_name
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_trims_fields() {
        let request = AssignmentRequest::new("  Jane ", "Doe", " CS101 ");
        let pair = request.candidate().expect("valid request");
        assert_eq!(pair.tutor, TutorName::new("Jane", "Doe"));
        assert_eq!(pair.course, CourseCode("CS101".to_string()));
    }

    #[test]
    fn candidate_reports_first_blank_field() {
        let request = AssignmentRequest::new("Jane", "   ", "");
        assert_eq!(request.candidate(), Err(MissingField::LastName));
    }
}
