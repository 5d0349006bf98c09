mod config;
mod gates;
mod policy;

pub use config::GradePolicy;
pub use gates::{Gate, GateVerdict};
pub use policy::{Rejection, RejectionReason, RejectionView};

use serde::Serialize;
use tracing::debug;

use super::domain::{CandidatePair, CourseCode, TutorName};
use super::repository::{RecordStore, StoreError};

/// Overall eligibility for a candidate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(Rejection),
}

/// Audit entry recorded for each gate that was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateRecord {
    pub gate: Gate,
    pub passed: bool,
}

/// Gate list passed to [`EligibilityChecker::with_gates`] that skips or repeats a gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("gate order must name each of the five gates exactly once, got {0:?}")]
pub struct GateOrderError(pub Vec<Gate>);

/// Ordered, short-circuiting list of gates. Every call re-queries the store.
#[derive(Debug, Clone)]
pub struct EligibilityChecker {
    gates: Vec<Gate>,
    grades: GradePolicy,
}

impl Default for EligibilityChecker {
    fn default() -> Self {
        Self::new(GradePolicy::default())
    }
}

impl EligibilityChecker {
    pub fn new(grades: GradePolicy) -> Self {
        Self {
            gates: Gate::STANDARD_ORDER.to_vec(),
            grades,
        }
    }

    /// Use a custom evaluation order. The list must name every gate exactly once.
    pub fn with_gates(gates: Vec<Gate>, grades: GradePolicy) -> Result<Self, GateOrderError> {
        let complete = gates.len() == Gate::STANDARD_ORDER.len()
            && Gate::STANDARD_ORDER
                .iter()
                .all(|required| gates.contains(required));
        if !complete {
            return Err(GateOrderError(gates));
        }
        Ok(Self { gates, grades })
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn grade_policy(&self) -> &GradePolicy {
        &self.grades
    }

    pub fn is_tutor_registered<S>(&self, store: &S, name: &TutorName) -> Result<bool, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        Ok(store.find_tutor(name)?.is_some())
    }

    pub fn is_course_valid<S>(&self, store: &S, course: &CourseCode) -> Result<bool, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        store.course_exists(course)
    }

    pub fn has_taken_course<S>(
        &self,
        store: &S,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<bool, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        store.has_taken_course(name, course)
    }

    /// Whether the most recent grade is in the qualifying set; a missing grade does not qualify.
    pub fn grade_qualifies<S>(
        &self,
        store: &S,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<bool, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        Ok(store
            .latest_grade(name, course)?
            .map(|grade| self.grades.qualifies(grade.as_str()))
            .unwrap_or(false))
    }

    pub fn is_already_assigned<S>(
        &self,
        store: &S,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<bool, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        store.is_assigned(name, course)
    }

    /// Evaluate the gates in order, stopping at the first failure.
    pub fn check<S>(&self, store: &S, pair: &CandidatePair) -> Result<Eligibility, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        for gate in &self.gates {
            match gate.evaluate(store, pair, &self.grades)? {
                GateVerdict::Pass => {
                    debug!(gate = gate.label(), course = %pair.course, "gate passed");
                }
                GateVerdict::Fail(rejection) => {
                    debug!(
                        gate = gate.label(),
                        course = %pair.course,
                        reason = rejection.reason().code(),
                        "gate failed"
                    );
                    return Ok(Eligibility::Ineligible(rejection));
                }
            }
        }
        Ok(Eligibility::Eligible)
    }

    /// Same evaluation as [`check`](Self::check), keeping a record of each gate reached.
    pub fn trace<S>(
        &self,
        store: &S,
        pair: &CandidatePair,
    ) -> Result<(Eligibility, Vec<GateRecord>), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let mut records = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            let verdict = gate.evaluate(store, pair, &self.grades)?;
            let passed = verdict == GateVerdict::Pass;
            records.push(GateRecord {
                gate: *gate,
                passed,
            });
            if let GateVerdict::Fail(rejection) = verdict {
                return Ok((Eligibility::Ineligible(rejection), records));
            }
        }
        Ok((Eligibility::Eligible, records))
    }
}
