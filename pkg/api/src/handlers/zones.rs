use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use pkg_metrics::ZONES;
use pkg_types::zone::{ZoneSpec, ZoneSync};

use crate::AppState;
use crate::error::ApiResult;

async fn refresh_zone_gauge(state: &AppState) {
    if let Ok(zones) = state.zones.list().await {
        state.metrics.gauge_set(ZONES, zones.len() as i64);
    }
}

/// POST /api/v1/zones
pub async fn create_zone(
    State(state): State<AppState>,
    Json(spec): Json<ZoneSpec>,
) -> ApiResult<impl IntoResponse> {
    let zone = state.zones.register(spec).await?;
    refresh_zone_gauge(&state).await;
    Ok((StatusCode::CREATED, Json(zone)))
}

/// GET /api/v1/zones
pub async fn list_zones(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.zones.list().await?))
}

/// GET /api/v1/zones/{zone_id}
pub async fn get_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.zones.get(&zone_id).await?))
}

/// PUT /api/v1/zones/{zone_id}
pub async fn update_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Json(spec): Json<ZoneSpec>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.zones.update(&zone_id, spec).await?))
}

/// PUT /api/v1/zones/{zone_id}/sync: status and capacity reported by the cluster.
pub async fn sync_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Json(sync): Json<ZoneSync>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.zones.sync(&zone_id, sync).await?))
}

/// DELETE /api/v1/zones/{zone_id}
///
/// Refused with 409 while any VDC still references the zone.
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.zones.delete(&zone_id).await?;
    refresh_zone_gauge(&state).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/zones/{zone_id}/utilization
pub async fn zone_utilization(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.aggregator.zone_utilization(&zone_id).await?))
}

/// GET /api/v1/zones/utilization
pub async fn all_zone_utilization(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.aggregator.all_zone_utilization().await?))
}
