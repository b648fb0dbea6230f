use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use pkg_admission::handle_review;
use pkg_metrics::{ADMISSION_ALLOWED, ADMISSION_DECODE_ERRORS, ADMISSION_DENIED};

use crate::AppState;

/// POST /admission/validate: AdmissionReview in, AdmissionReview out.
pub async fn validate(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let outcome = handle_review(state.admission.as_ref(), &body).await;

    let counter = if outcome.decision.is_decode_error() {
        ADMISSION_DECODE_ERRORS
    } else if outcome.decision.allowed {
        ADMISSION_ALLOWED
    } else {
        ADMISSION_DENIED
    };
    state.metrics.counter_inc(counter);

    let status = StatusCode::from_u16(outcome.http_status).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(outcome.review))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
