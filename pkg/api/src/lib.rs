pub mod auth;
pub mod error;
pub mod handlers;
pub mod request_id;
pub mod server;

use std::sync::Arc;

use pkg_admission::NamespacePolicy;
use pkg_governance::aggregate::UtilizationAggregator;
use pkg_governance::ledger::QuotaLedger;
use pkg_governance::locks::ZoneLocks;
use pkg_governance::provision::Provisioner;
use pkg_governance::zones::ZoneRegistry;
use pkg_metrics::MetricsRegistry;
use pkg_state::GovernanceStore;

/// Backend as seen by the API: any store implementing every collaborator.
pub type DynStore = dyn GovernanceStore;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DynStore>,
    pub zones: Arc<ZoneRegistry<DynStore>>,
    pub ledger: Arc<QuotaLedger<DynStore>>,
    pub provisioner: Arc<Provisioner<DynStore>>,
    pub aggregator: Arc<UtilizationAggregator<DynStore>>,
    pub admission: Arc<NamespacePolicy<DynStore>>,
    pub metrics: Arc<MetricsRegistry>,
    /// Bearer token for `/api/v1`. Empty disables authentication.
    pub token: String,
}

impl AppState {
    pub fn new(store: Arc<DynStore>, token: String) -> Self {
        // Zone mutations and VDC commits serialize on the same guards.
        let locks = ZoneLocks::new();
        Self {
            zones: Arc::new(ZoneRegistry::new(store.clone(), locks.clone())),
            ledger: Arc::new(QuotaLedger::new(store.clone())),
            provisioner: Arc::new(Provisioner::new(store.clone(), locks)),
            aggregator: Arc::new(UtilizationAggregator::new(store.clone())),
            admission: Arc::new(NamespacePolicy::new(store.clone())),
            metrics: Arc::new(MetricsRegistry::governance()),
            store,
            token,
        }
    }
}
