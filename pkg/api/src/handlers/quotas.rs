use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use pkg_types::quota::{OrgZoneQuota, OrgZoneQuotaSpec};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct QuotaListQuery {
    #[serde(default)]
    pub org: Option<String>,
}

fn row_from_spec(org_id: String, zone_id: String, spec: OrgZoneQuotaSpec) -> OrgZoneQuota {
    let now = Utc::now();
    OrgZoneQuota {
        org_id,
        zone_id,
        quota: spec.quota,
        is_allowed: spec.is_allowed,
        created_at: now,
        updated_at: now,
        zone: None,
    }
}

// --- Ledger rows ---

/// POST /api/v1/organizations/{org}/zones/{zone}/quota
pub async fn create_quota(
    State(state): State<AppState>,
    Path((org_id, zone_id)): Path<(String, String)>,
    Json(spec): Json<OrgZoneQuotaSpec>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .ledger
        .create(row_from_spec(org_id, zone_id, spec))
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/organizations/{org}/zones/{zone}/quota
pub async fn get_quota(
    State(state): State<AppState>,
    Path((org_id, zone_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ledger.get(&org_id, &zone_id).await?))
}

/// PUT /api/v1/organizations/{org}/zones/{zone}/quota
pub async fn update_quota(
    State(state): State<AppState>,
    Path((org_id, zone_id)): Path<(String, String)>,
    Json(spec): Json<OrgZoneQuotaSpec>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .ledger
        .update(row_from_spec(org_id, zone_id, spec))
        .await?;
    Ok(Json(row))
}

/// DELETE /api/v1/organizations/{org}/zones/{zone}/quota
pub async fn delete_quota(
    State(state): State<AppState>,
    Path((org_id, zone_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state.ledger.delete(&org_id, &zone_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/zone-quotas?org=<org>
pub async fn list_quotas(
    State(state): State<AppState>,
    Query(query): Query<QuotaListQuery>,
) -> ApiResult<impl IntoResponse> {
    let org = query.org.unwrap_or_default();
    Ok(Json(state.ledger.list(&org).await?))
}

/// GET /api/v1/organizations/{org}/zone-quotas
pub async fn list_org_quotas(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ledger.list(&org_id).await?))
}

// --- Derived views ---

/// GET /api/v1/organizations/{org}/zone-access
pub async fn zone_access(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ledger.get_access(&org_id).await?))
}

/// GET /api/v1/organizations/{org}/zones/{zone}/usage
pub async fn org_usage(
    State(state): State<AppState>,
    Path((org_id, zone_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.aggregator.org_usage(&org_id, &zone_id).await?))
}
