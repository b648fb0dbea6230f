use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use pkg_constants::network::ADMISSION_VALIDATE_PATH;
use pkg_metrics::ZONES;
use pkg_state::ZoneStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::auth_middleware;
use crate::handlers::{admission, namespaces, quotas, vdcs, zones};
use crate::request_id::request_id_middleware;
use crate::{AppState, DynStore};

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub token: String,
}

/// Full route table. Everything under `/api/v1` requires the bearer token;
/// the admission webhook and `/metrics` do not.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // zones
        .route("/api/v1/zones", post(zones::create_zone).get(zones::list_zones))
        .route("/api/v1/zones/utilization", get(zones::all_zone_utilization))
        .route(
            "/api/v1/zones/{zone_id}",
            get(zones::get_zone)
                .put(zones::update_zone)
                .delete(zones::delete_zone),
        )
        .route("/api/v1/zones/{zone_id}/sync", put(zones::sync_zone))
        .route(
            "/api/v1/zones/{zone_id}/utilization",
            get(zones::zone_utilization),
        )
        // ledger
        .route("/api/v1/zone-quotas", get(quotas::list_quotas))
        .route(
            "/api/v1/organizations/{org}/zone-quotas",
            get(quotas::list_org_quotas),
        )
        .route(
            "/api/v1/organizations/{org}/zone-access",
            get(quotas::zone_access),
        )
        .route(
            "/api/v1/organizations/{org}/zones/{zone}/quota",
            post(quotas::create_quota)
                .get(quotas::get_quota)
                .put(quotas::update_quota)
                .delete(quotas::delete_quota),
        )
        .route(
            "/api/v1/organizations/{org}/zones/{zone}/usage",
            get(quotas::org_usage),
        )
        // placement
        .route(
            "/api/v1/organizations/{org}/zones/{zone}/accommodate",
            post(vdcs::check_placement),
        )
        .route(
            "/api/v1/organizations/{org}/vdcs",
            post(vdcs::create_vdc).get(vdcs::list_vdcs),
        )
        .route(
            "/api/v1/organizations/{org}/vdcs/{vdc}",
            get(vdcs::get_vdc).delete(vdcs::delete_vdc),
        )
        .route(
            "/api/v1/organizations/{org}/vdcs/{vdc}/resources",
            put(vdcs::resize_vdc),
        )
        .route(
            "/api/v1/organizations/{org}/vdcs/{vdc}/phase",
            put(vdcs::set_vdc_phase),
        )
        // namespaces
        .route(
            "/api/v1/namespaces",
            post(namespaces::create_namespace).get(namespaces::list_namespaces),
        )
        .route(
            "/api/v1/namespaces/{name}",
            delete(namespaces::delete_namespace),
        )
        .route(
            "/api/v1/organizations/{org}/namespace",
            post(namespaces::create_org_namespace),
        )
        .route(
            "/api/v1/organizations/{org}/vdcs/{vdc}/namespace",
            post(namespaces::create_vdc_namespace),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route(ADMISSION_VALIDATE_PATH, post(admission::validate))
        .route("/metrics", get(admission::metrics))
        .merge(api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_server(config: ServerConfig, store: Arc<DynStore>) -> anyhow::Result<()> {
    let state = AppState::new(store.clone(), config.token);

    let zone_count = store.list_zones().await?.len();
    state.metrics.gauge_set(ZONES, zone_count as i64);
    info!("Loaded {} zones from store", zone_count);

    let app = build_router(state);

    info!("Starting API server on {}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
