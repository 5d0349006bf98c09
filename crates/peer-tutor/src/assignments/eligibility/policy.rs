use serde::{Deserialize, Serialize};

use super::super::domain::LetterGrade;

/// Stable code for each gate failure, suitable for API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotRegistered,
    InvalidCourse,
    CourseNotTaken,
    GradeInsufficient,
    AlreadyAssigned,
}

impl RejectionReason {
    pub const fn code(self) -> &'static str {
        match self {
            RejectionReason::NotRegistered => "not_registered",
            RejectionReason::InvalidCourse => "invalid_course",
            RejectionReason::CourseNotTaken => "course_not_taken",
            RejectionReason::GradeInsufficient => "grade_insufficient",
            RejectionReason::AlreadyAssigned => "already_assigned",
        }
    }
}

/// Business rejection raised by the first failing gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotRegistered,
    InvalidCourse,
    CourseNotTaken,
    /// `recorded` is `None` when the student has no grade on file for the course.
    GradeInsufficient { recorded: Option<LetterGrade> },
    AlreadyAssigned,
}

impl Rejection {
    pub fn reason(&self) -> RejectionReason {
        match self {
            Rejection::NotRegistered => RejectionReason::NotRegistered,
            Rejection::InvalidCourse => RejectionReason::InvalidCourse,
            Rejection::CourseNotTaken => RejectionReason::CourseNotTaken,
            Rejection::GradeInsufficient { .. } => RejectionReason::GradeInsufficient,
            Rejection::AlreadyAssigned => RejectionReason::AlreadyAssigned,
        }
    }

    /// Grade that failed the qualifying check, when one was on file.
    pub fn recorded_grade(&self) -> Option<&LetterGrade> {
        match self {
            Rejection::GradeInsufficient { recorded } => recorded.as_ref(),
            _ => None,
        }
    }

    /// Wire shape shared by every endpoint that reports a rejection.
    pub fn view(&self) -> RejectionView {
        RejectionView {
            reason: self.reason(),
            message: self.summary(),
            recorded_grade: self.recorded_grade().map(|grade| grade.as_str().to_string()),
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Rejection::NotRegistered => "the person is not registered as a peer tutor".to_string(),
            Rejection::InvalidCourse => "the course is not valid".to_string(),
            Rejection::CourseNotTaken => "the peer tutor has not taken the course".to_string(),
            Rejection::GradeInsufficient { recorded: Some(grade) } => format!(
                "the letter grade obtained by the peer tutor for the course is not sufficient ({})",
                grade.as_str()
            ),
            Rejection::GradeInsufficient { recorded: None } => {
                "no letter grade is recorded for the peer tutor in the course".to_string()
            }
            Rejection::AlreadyAssigned => {
                "the peer tutor is already assigned to the course".to_string()
            }
        }
    }
}

/// Serialized form of a [`Rejection`]: `{reason, message, recorded_grade}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionView {
    pub reason: RejectionReason,
    pub message: String,
    pub recorded_grade: Option<String>,
}
