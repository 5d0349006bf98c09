use serde::Serialize;

use super::super::domain::CandidatePair;
use super::super::repository::{RecordStore, StoreError};
use super::config::GradePolicy;
use super::policy::Rejection;

/// One named eligibility predicate in the assignment check sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Registered,
    CourseValid,
    CourseTaken,
    GradeQualifies,
    NotAlreadyAssigned,
}

impl Gate {
    /// Evaluation order for assignment requests.
    pub const STANDARD_ORDER: [Gate; 5] = [
        Gate::Registered,
        Gate::CourseValid,
        Gate::CourseTaken,
        Gate::GradeQualifies,
        Gate::NotAlreadyAssigned,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Gate::Registered => "registered",
            Gate::CourseValid => "course_valid",
            Gate::CourseTaken => "course_taken",
            Gate::GradeQualifies => "grade_qualifies",
            Gate::NotAlreadyAssigned => "not_already_assigned",
        }
    }

    pub(crate) fn evaluate<S>(
        self,
        store: &S,
        pair: &CandidatePair,
        grades: &GradePolicy,
    ) -> Result<GateVerdict, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let verdict = match self {
            Gate::Registered => {
                pass_or(store.find_tutor(&pair.tutor)?.is_some(), Rejection::NotRegistered)
            }
            Gate::CourseValid => pass_or(store.course_exists(&pair.course)?, Rejection::InvalidCourse),
            Gate::CourseTaken => pass_or(
                store.has_taken_course(&pair.tutor, &pair.course)?,
                Rejection::CourseNotTaken,
            ),
            Gate::GradeQualifies => {
                let recorded = store.latest_grade(&pair.tutor, &pair.course)?;
                match recorded {
                    Some(grade) if grades.qualifies(grade.as_str()) => GateVerdict::Pass,
                    recorded => GateVerdict::Fail(Rejection::GradeInsufficient { recorded }),
                }
            }
            Gate::NotAlreadyAssigned => pass_or(
                !store.is_assigned(&pair.tutor, &pair.course)?,
                Rejection::AlreadyAssigned,
            ),
        };
        Ok(verdict)
    }
}

fn pass_or(passed: bool, rejection: Rejection) -> GateVerdict {
    if passed {
        GateVerdict::Pass
    } else {
        GateVerdict::Fail(rejection)
    }
}

/// Result of a single gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Pass,
    Fail(Rejection),
}
