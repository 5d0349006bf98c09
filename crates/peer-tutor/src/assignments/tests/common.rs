use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::assignments::domain::{
    AssignmentRequest, CandidatePair, CourseCode, LetterGrade, Tutor, TutorId, TutorName,
};
use crate::assignments::repository::{RecordStore, StoreError};
use crate::assignments::{assignment_router, AssignmentService, GradePolicy};

/// Store operations, logged in call order so tests can assert which gates ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StoreCall {
    FindTutor,
    CourseExists,
    HasTakenCourse,
    LatestGrade,
    IsAssigned,
    CommitAssignment,
    Roster,
}

#[derive(Default)]
pub(super) struct MemoryState {
    tutors: Vec<Tutor>,
    courses: HashSet<String>,
    enrollments: HashSet<(TutorName, String)>,
    grades: HashMap<(TutorName, String), String>,
    assignments: Vec<(TutorId, String)>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl MemoryRecordStore {
    pub(super) fn with_tutor(self, first_name: &str, last_name: &str) -> Self {
        {
            let mut state = self.state.lock().expect("store mutex poisoned");
            let id = TutorId(state.tutors.len() as i64 + 1);
            state.tutors.push(Tutor {
                id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            });
        }
        self
    }

    pub(super) fn with_course(self, code: &str) -> Self {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .courses
            .insert(code.to_string());
        self
    }

    pub(super) fn with_enrollment(self, first_name: &str, last_name: &str, code: &str) -> Self {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .enrollments
            .insert((TutorName::new(first_name, last_name), code.to_string()));
        self
    }

    pub(super) fn with_grade(
        self,
        first_name: &str,
        last_name: &str,
        code: &str,
        grade: &str,
    ) -> Self {
        self.state.lock().expect("store mutex poisoned").grades.insert(
            (TutorName::new(first_name, last_name), code.to_string()),
            grade.to_string(),
        );
        self
    }

    pub(super) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub(super) fn clear_calls(&self) {
        self.calls.lock().expect("call log poisoned").clear();
    }

    pub(super) fn assignment_count(&self) -> usize {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .assignments
            .len()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }

    fn tutor(state: &MemoryState, name: &TutorName) -> Option<Tutor> {
        state
            .tutors
            .iter()
            .find(|tutor| tutor.first_name == name.first_name && tutor.last_name == name.last_name)
            .cloned()
    }

    fn roster_for(state: &MemoryState, course: &CourseCode) -> Vec<Tutor> {
        let mut tutors: Vec<Tutor> = state
            .assignments
            .iter()
            .filter(|(_, code)| code == course.as_str())
            .filter_map(|(id, _)| state.tutors.iter().find(|tutor| tutor.id == *id).cloned())
            .collect();
        tutors.sort_by_key(|tutor| tutor.id);
        tutors
    }
}

impl RecordStore for MemoryRecordStore {
    fn find_tutor(&self, name: &TutorName) -> Result<Option<Tutor>, StoreError> {
        self.record(StoreCall::FindTutor);
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(Self::tutor(&state, name))
    }

    fn course_exists(&self, course: &CourseCode) -> Result<bool, StoreError> {
        self.record(StoreCall::CourseExists);
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.courses.contains(course.as_str()))
    }

    fn has_taken_course(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError> {
        self.record(StoreCall::HasTakenCourse);
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .enrollments
            .contains(&(name.clone(), course.as_str().to_string())))
    }

    fn latest_grade(
        &self,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<Option<LetterGrade>, StoreError> {
        self.record(StoreCall::LatestGrade);
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .grades
            .get(&(name.clone(), course.as_str().to_string()))
            .cloned()
            .map(LetterGrade))
    }

    fn is_assigned(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError> {
        self.record(StoreCall::IsAssigned);
        let state = self.state.lock().expect("store mutex poisoned");
        let Some(tutor) = Self::tutor(&state, name) else {
            return Ok(false);
        };
        Ok(state
            .assignments
            .iter()
            .any(|(id, code)| *id == tutor.id && code == course.as_str()))
    }

    fn commit_assignment(&self, pair: &CandidatePair) -> Result<Vec<Tutor>, StoreError> {
        self.record(StoreCall::CommitAssignment);
        let mut state = self.state.lock().expect("store mutex poisoned");
        let tutor = Self::tutor(&state, &pair.tutor)
            .ok_or_else(|| StoreError::NotFound(pair.tutor.to_string()))?;
        if state
            .assignments
            .iter()
            .any(|(id, code)| *id == tutor.id && code == pair.course.as_str())
        {
            return Err(StoreError::Conflict);
        }
        state
            .assignments
            .push((tutor.id, pair.course.as_str().to_string()));
        Ok(Self::roster_for(&state, &pair.course))
    }

    fn roster(&self, course: &CourseCode) -> Result<Vec<Tutor>, StoreError> {
        self.record(StoreCall::Roster);
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(Self::roster_for(&state, course))
    }
}

/// Store whose every query fails as if the database were offline.
pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn find_tutor(&self, _name: &TutorName) -> Result<Option<Tutor>, StoreError> {
        Err(offline())
    }

    fn course_exists(&self, _course: &CourseCode) -> Result<bool, StoreError> {
        Err(offline())
    }

    fn has_taken_course(&self, _name: &TutorName, _course: &CourseCode) -> Result<bool, StoreError> {
        Err(offline())
    }

    fn latest_grade(
        &self,
        _name: &TutorName,
        _course: &CourseCode,
    ) -> Result<Option<LetterGrade>, StoreError> {
        Err(offline())
    }

    fn is_assigned(&self, _name: &TutorName, _course: &CourseCode) -> Result<bool, StoreError> {
        Err(offline())
    }

    fn commit_assignment(&self, _pair: &CandidatePair) -> Result<Vec<Tutor>, StoreError> {
        Err(offline())
    }

    fn roster(&self, _course: &CourseCode) -> Result<Vec<Tutor>, StoreError> {
        Err(offline())
    }
}

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

/// Delegates to a memory store but fails the chosen operation.
pub(super) struct FailingStore {
    pub(super) inner: MemoryRecordStore,
    pub(super) fail_on: StoreCall,
    pub(super) error: fn() -> StoreError,
}

impl FailingStore {
    fn gate(&self, call: StoreCall) -> Result<(), StoreError> {
        if call == self.fail_on {
            Err((self.error)())
        } else {
            Ok(())
        }
    }
}

impl RecordStore for FailingStore {
    fn find_tutor(&self, name: &TutorName) -> Result<Option<Tutor>, StoreError> {
        self.gate(StoreCall::FindTutor)?;
        self.inner.find_tutor(name)
    }

    fn course_exists(&self, course: &CourseCode) -> Result<bool, StoreError> {
        self.gate(StoreCall::CourseExists)?;
        self.inner.course_exists(course)
    }

    fn has_taken_course(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError> {
        self.gate(StoreCall::HasTakenCourse)?;
        self.inner.has_taken_course(name, course)
    }

    fn latest_grade(
        &self,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<Option<LetterGrade>, StoreError> {
        self.gate(StoreCall::LatestGrade)?;
        self.inner.latest_grade(name, course)
    }

    fn is_assigned(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError> {
        self.gate(StoreCall::IsAssigned)?;
        self.inner.is_assigned(name, course)
    }

    fn commit_assignment(&self, pair: &CandidatePair) -> Result<Vec<Tutor>, StoreError> {
        self.gate(StoreCall::CommitAssignment)?;
        self.inner.commit_assignment(pair)
    }

    fn roster(&self, course: &CourseCode) -> Result<Vec<Tutor>, StoreError> {
        self.gate(StoreCall::Roster)?;
        self.inner.roster(course)
    }
}

/// Jane Doe: registered, enrolled in CS101 with an A, not yet assigned.
pub(super) fn eligible_store() -> MemoryRecordStore {
    MemoryRecordStore::default()
        .with_tutor("Jane", "Doe")
        .with_course("CS101")
        .with_enrollment("Jane", "Doe", "CS101")
        .with_grade("Jane", "Doe", "CS101", "A")
}

pub(super) fn jane_cs101() -> AssignmentRequest {
    AssignmentRequest::new("Jane", "Doe", "CS101")
}

pub(super) fn candidate(first_name: &str, last_name: &str, code: &str) -> CandidatePair {
    CandidatePair {
        tutor: TutorName::new(first_name, last_name),
        course: CourseCode(code.to_string()),
    }
}

pub(super) fn build_service(
    store: MemoryRecordStore,
) -> (AssignmentService<MemoryRecordStore>, Arc<MemoryRecordStore>) {
    let store = Arc::new(store);
    let service = AssignmentService::new(store.clone(), GradePolicy::default());
    (service, store)
}

pub(super) fn router_with_store<S>(store: S) -> axum::Router
where
    S: RecordStore + 'static,
{
    assignment_router(Arc::new(AssignmentService::new(
        Arc::new(store),
        GradePolicy::default(),
    )))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
