use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use pkg_constants::resources::{GROUP_CORE, KIND_NAMESPACE};
use pkg_metrics::{ADMISSION_ALLOWED, ADMISSION_DECODE_ERRORS, ADMISSION_DENIED};
use pkg_state::NamespaceStore;
use pkg_types::error::GovernanceError;
use pkg_types::namespace::{
    Namespace, org_namespace_labels, org_namespace_name, vdc_namespace_labels, vdc_namespace_name,
};
use serde_json::json;
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Run a namespace through the topology policy, then persist it.
async fn admit_and_create(state: &AppState, mut ns: Namespace) -> ApiResult<Namespace> {
    let object = json!({ "metadata": { "name": ns.name, "labels": ns.labels } });
    let decision = state
        .admission
        .decide(GROUP_CORE, KIND_NAMESPACE, "CREATE", None, Some(&object))
        .await;
    if decision.is_decode_error() {
        state.metrics.counter_inc(ADMISSION_DECODE_ERRORS);
        return Err(GovernanceError::Decode(decision.message).into());
    }
    if !decision.allowed {
        state.metrics.counter_inc(ADMISSION_DENIED);
        return Err(ApiError::forbidden("admission_denied", decision.message));
    }
    state.metrics.counter_inc(ADMISSION_ALLOWED);

    ns.created_at = Utc::now();
    let ns = state.store.create_namespace(ns).await?;
    info!("Created namespace: {}", ns.name);
    Ok(ns)
}

/// POST /api/v1/namespaces
pub async fn create_namespace(
    State(state): State<AppState>,
    Json(ns): Json<Namespace>,
) -> ApiResult<impl IntoResponse> {
    let ns = admit_and_create(&state, ns).await?;
    Ok((StatusCode::CREATED, Json(ns)))
}

/// GET /api/v1/namespaces
pub async fn list_namespaces(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.store.list_namespaces().await?))
}

/// DELETE /api/v1/namespaces/{name}
pub async fn delete_namespace(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.store.delete_namespace(&name).await?;
    info!("Deleted namespace: {}", name);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/organizations/{org}/namespace: the organization's own
/// namespace, labelled as the management plane labels it.
pub async fn create_org_namespace(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ns = Namespace {
        name: org_namespace_name(&org_id),
        labels: org_namespace_labels(&org_id),
        created_at: Utc::now(),
    };
    let ns = admit_and_create(&state, ns).await?;
    Ok((StatusCode::CREATED, Json(ns)))
}

/// POST /api/v1/organizations/{org}/vdcs/{vdc}/namespace: the workload
/// namespace of an existing VDC.
pub async fn create_vdc_namespace(
    State(state): State<AppState>,
    Path((org_id, vdc_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let vdc = state.provisioner.get(&org_id, &vdc_id).await?;
    let ns = Namespace {
        name: vdc_namespace_name(&org_id, &vdc.id),
        labels: vdc_namespace_labels(&org_id, &vdc.id),
        created_at: Utc::now(),
    };
    let ns = admit_and_create(&state, ns).await?;
    Ok((StatusCode::CREATED, Json(ns)))
}
