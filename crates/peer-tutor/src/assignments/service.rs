use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::{info, warn};

use super::domain::{
    AssignmentRequest, CandidatePair, CourseCode, MissingField, RosterSnapshot, TutorName,
};
use super::eligibility::{Eligibility, EligibilityChecker, GateRecord, GradePolicy, Rejection};
use super::repository::{RecordStore, StoreError};

/// Outcome of an assignment attempt that reached the store without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentDecision {
    Assigned(RosterSnapshot),
    Rejected(Rejection),
}

/// Gate-by-gate view of a candidate pair, produced without writing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_rejection"
    )]
    pub rejection: Option<Rejection>,
    pub gates: Vec<GateRecord>,
}

fn serialize_rejection<Ser>(rejection: &Option<Rejection>, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
where
    Ser: Serializer,
{
    rejection.as_ref().map(Rejection::view).serialize(serializer)
}

/// Service composing the eligibility checker with the record store.
pub struct AssignmentService<S> {
    store: Arc<S>,
    checker: EligibilityChecker,
}

impl<S> AssignmentService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>, grades: GradePolicy) -> Self {
        Self::with_checker(store, EligibilityChecker::new(grades))
    }

    pub fn with_checker(store: Arc<S>, checker: EligibilityChecker) -> Self {
        Self { store, checker }
    }

    pub fn checker(&self) -> &EligibilityChecker {
        &self.checker
    }

    /// Validate the raw fields, run every gate and commit the assignment when all pass.
    pub fn assign(
        &self,
        request: &AssignmentRequest,
    ) -> Result<AssignmentDecision, AssignmentServiceError> {
        let pair = request.candidate()?;
        self.assign_pair(&pair)
    }

    pub fn assign_pair(
        &self,
        pair: &CandidatePair,
    ) -> Result<AssignmentDecision, AssignmentServiceError> {
        let eligibility = self
            .checker
            .check(self.store.as_ref(), pair)
            .map_err(|err| store_failure(pair, err))?;

        if let Eligibility::Ineligible(rejection) = eligibility {
            return Ok(AssignmentDecision::Rejected(rejection));
        }

        let tutors = match self.store.commit_assignment(pair) {
            Ok(tutors) => tutors,
            Err(StoreError::Conflict) => {
                warn!(tutor = %pair.tutor, course = %pair.course, "concurrent duplicate assignment");
                return Err(AssignmentServiceError::DuplicateAssignment {
                    tutor: pair.tutor.clone(),
                    course: pair.course.clone(),
                });
            }
            Err(err) => return Err(store_failure(pair, err)),
        };

        info!(
            tutor = %pair.tutor,
            course = %pair.course,
            roster_size = tutors.len(),
            "peer tutor assigned"
        );

        Ok(AssignmentDecision::Assigned(RosterSnapshot {
            course_code: pair.course.clone(),
            tutors,
        }))
    }

    /// Run the gates without committing, reporting every gate reached.
    pub fn eligibility(
        &self,
        request: &AssignmentRequest,
    ) -> Result<EligibilityReport, AssignmentServiceError> {
        let pair = request.candidate()?;
        let (eligibility, gates) = self
            .checker
            .trace(self.store.as_ref(), &pair)
            .map_err(|err| store_failure(&pair, err))?;

        let rejection = match eligibility {
            Eligibility::Eligible => None,
            Eligibility::Ineligible(rejection) => Some(rejection),
        };

        Ok(EligibilityReport {
            eligible: rejection.is_none(),
            rejection,
            gates,
        })
    }

    /// Fetch the current roster for a course that exists in the catalog.
    pub fn roster(&self, course_code: &str) -> Result<RosterSnapshot, AssignmentServiceError> {
        let trimmed = course_code.trim();
        if trimmed.is_empty() {
            return Err(MissingField::CourseCode.into());
        }
        let course = CourseCode(trimmed.to_string());

        if !self.store.course_exists(&course)? {
            return Err(AssignmentServiceError::UnknownCourse(course));
        }

        let tutors = self.store.roster(&course)?;
        Ok(RosterSnapshot {
            course_code: course,
            tutors,
        })
    }
}

fn store_failure(pair: &CandidatePair, err: StoreError) -> AssignmentServiceError {
    warn!(tutor = %pair.tutor, course = %pair.course, error = %err, "record store failure");
    AssignmentServiceError::Store(err)
}

/// Error raised by the assignment service. Business rejections are never reported here.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentServiceError {
    #[error(transparent)]
    InvalidRequest(#[from] MissingField),
    #[error("course {0} does not exist")]
    UnknownCourse(CourseCode),
    #[error("{tutor} is already assigned to {course}")]
    DuplicateAssignment { tutor: TutorName, course: CourseCode },
    #[error(transparent)]
    Store(#[from] StoreError),
}
