use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use pkg_governance::placement::PlacementDecision;
use pkg_metrics::{PLACEMENT_ACCEPTED, PLACEMENT_DENIED};
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::resources::ResourceAmounts;
use pkg_types::vdc::{CreateVdcRequest, ResizeVdcRequest, UpdateVdcPhaseRequest};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiResult;

/// Count a placement-gated outcome; non-policy failures are not counted.
fn record_placement<T>(state: &AppState, result: &GovernanceResult<T>) {
    match result {
        Ok(_) => state.metrics.counter_inc(PLACEMENT_ACCEPTED),
        Err(GovernanceError::PolicyDenied(_)) => state.metrics.counter_inc(PLACEMENT_DENIED),
        Err(_) => {}
    }
}

/// Body of a dry-run placement check.
#[derive(Debug, Serialize)]
pub struct PlacementCheck {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub reason: String,
}

/// POST /api/v1/organizations/{org}/vdcs
pub async fn create_vdc(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(req): Json<CreateVdcRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.provisioner.create(&org_id, req).await;
    record_placement(&state, &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

/// GET /api/v1/organizations/{org}/vdcs
pub async fn list_vdcs(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.provisioner.list(&org_id).await?))
}

/// GET /api/v1/organizations/{org}/vdcs/{vdc}
pub async fn get_vdc(
    State(state): State<AppState>,
    Path((org_id, vdc_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.provisioner.get(&org_id, &vdc_id).await?))
}

/// PUT /api/v1/organizations/{org}/vdcs/{vdc}/resources
pub async fn resize_vdc(
    State(state): State<AppState>,
    Path((org_id, vdc_id)): Path<(String, String)>,
    Json(req): Json<ResizeVdcRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state
        .provisioner
        .resize(&org_id, &vdc_id, req.resources)
        .await;
    record_placement(&state, &result);
    Ok(Json(result?))
}

/// PUT /api/v1/organizations/{org}/vdcs/{vdc}/phase
pub async fn set_vdc_phase(
    State(state): State<AppState>,
    Path((org_id, vdc_id)): Path<(String, String)>,
    Json(req): Json<UpdateVdcPhaseRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state
            .provisioner
            .set_phase(&org_id, &vdc_id, req.phase)
            .await?,
    ))
}

/// DELETE /api/v1/organizations/{org}/vdcs/{vdc}
pub async fn delete_vdc(
    State(state): State<AppState>,
    Path((org_id, vdc_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state.provisioner.delete(&org_id, &vdc_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/organizations/{org}/zones/{zone}/accommodate
///
/// Read-only placement check. Nothing is reserved; the answer may be stale
/// by the time a create is sent.
pub async fn check_placement(
    State(state): State<AppState>,
    Path((org_id, zone_id)): Path<(String, String)>,
    Json(request): Json<ResourceAmounts>,
) -> ApiResult<impl IntoResponse> {
    let decision = state
        .provisioner
        .placement()
        .accommodate(&org_id, &zone_id, &request)
        .await?;
    let code = match &decision {
        PlacementDecision::Denied(denial) => Some(denial.code()),
        PlacementDecision::Accepted => None,
    };
    Ok(Json(PlacementCheck {
        accepted: decision.is_accepted(),
        code,
        reason: decision.reason(),
    }))
}
