use super::domain::{CandidatePair, CourseCode, LetterGrade, Tutor, TutorName};

/// Query surface of the academic record store.
///
/// Every predicate returns `Ok(false)`/`Ok(None)` only for a legitimate negative answer;
/// connectivity and execution failures are reported through [`StoreError`].
pub trait RecordStore: Send + Sync {
    /// Look up a registered tutor by exact first and last name.
    fn find_tutor(&self, name: &TutorName) -> Result<Option<Tutor>, StoreError>;

    fn course_exists(&self, course: &CourseCode) -> Result<bool, StoreError>;

    /// Whether the student linked to the tutor holds an enrollment record for the course.
    fn has_taken_course(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError>;

    /// Most recent letter grade recorded for the tutor's linked student in the course.
    fn latest_grade(
        &self,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<Option<LetterGrade>, StoreError>;

    fn is_assigned(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError>;

    /// Insert the assignment and read the course roster back within one unit of work.
    ///
    /// Fails with [`StoreError::Conflict`] when the pair is already assigned.
    fn commit_assignment(&self, pair: &CandidatePair) -> Result<Vec<Tutor>, StoreError>;

    /// Tutors assigned to the course, ordered by tutor id.
    fn roster(&self, course: &CourseCode) -> Result<Vec<Tutor>, StoreError>;
}

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("assignment already exists")]
    Conflict,
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store query failed: {0}")]
    Query(String),
}
