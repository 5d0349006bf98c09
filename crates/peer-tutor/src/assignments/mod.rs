//! Peer tutor eligibility gates, assignment workflow, and the record store behind them.

pub mod catalog;
pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod router;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogImporter, ImportError, ImportSummary};
pub use domain::{
    AssignmentRequest, CandidatePair, CourseCode, LetterGrade, MissingField, RosterSnapshot,
    Tutor, TutorId, TutorName,
};
pub use eligibility::{
    Eligibility, EligibilityChecker, Gate, GateOrderError, GateRecord, GradePolicy, Rejection,
    RejectionReason, RejectionView,
};
pub use repository::{RecordStore, StoreError};
pub use router::assignment_router;
pub use service::{
    AssignmentDecision, AssignmentService, AssignmentServiceError, EligibilityReport,
};
pub use sqlite::SqliteRecordStore;
