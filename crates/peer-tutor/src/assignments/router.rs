use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::AssignmentRequest;
use super::eligibility::Rejection;
use super::repository::{RecordStore, StoreError};
use super::service::{AssignmentDecision, AssignmentService, AssignmentServiceError};

/// Router builder exposing the assignment workflow over HTTP.
pub fn assignment_router<S>(service: Arc<AssignmentService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route("/api/v1/assignments", post(assign_handler::<S>))
        .route(
            "/api/v1/assignments/eligibility",
            post(eligibility_handler::<S>),
        )
        .route(
            "/api/v1/courses/:course_code/tutors",
            get(roster_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn assign_handler<S>(
    State(service): State<Arc<AssignmentService<S>>>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed_body(rejection),
    };

    let outcome = {
        let request = request.clone();
        blocking(move || service.assign(&request)).await
    };

    match outcome {
        Ok(Ok(AssignmentDecision::Assigned(roster))) => {
            (StatusCode::CREATED, Json(roster)).into_response()
        }
        Ok(Ok(AssignmentDecision::Rejected(rejection))) => rejection_response(&request, &rejection),
        Ok(Err(err)) => error_response(err),
        Err(response) => response,
    }
}

pub(crate) async fn eligibility_handler<S>(
    State(service): State<Arc<AssignmentService<S>>>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed_body(rejection),
    };

    match blocking(move || service.eligibility(&request)).await {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(response) => response,
    }
}

pub(crate) async fn roster_handler<S>(
    State(service): State<Arc<AssignmentService<S>>>,
    Path(course_code): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    match blocking(move || service.roster(&course_code)).await {
        Ok(Ok(roster)) => (StatusCode::OK, Json(roster)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(response) => response,
    }
}

/// Run store-bound work on the blocking pool; pool checkout and SQLite busy waits can stall.
async fn blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!(error = %err, "assignment task did not complete");
        let payload = json!({ "error": "assignment task did not complete" });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    })
}

fn malformed_body(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text() });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn rejection_response(request: &AssignmentRequest, rejection: &Rejection) -> Response {
    let view = rejection.view();
    let payload = json!({
        "reason": view.reason,
        "message": view.message,
        "first_name": request.first_name.trim(),
        "last_name": request.last_name.trim(),
        "course_code": request.course_code.trim(),
        "recorded_grade": view.recorded_grade,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

fn error_response(err: AssignmentServiceError) -> Response {
    let status = match &err {
        AssignmentServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AssignmentServiceError::UnknownCourse(_) => StatusCode::NOT_FOUND,
        AssignmentServiceError::DuplicateAssignment { .. } => StatusCode::CONFLICT,
        AssignmentServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AssignmentServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
