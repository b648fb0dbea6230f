use chrono::Utc;
use pkg_state::{MemoryStore, QuotaStore, VdcStore, ZoneStore};
use pkg_types::quota::OrgZoneQuota;
use pkg_types::resources::ResourceAmounts;
use pkg_types::vdc::{VdcPhase, VirtualDataCenter};
use pkg_types::zone::{Zone, ZoneStatus};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) fn amounts((cpu, memory, storage): (i64, i64, i64)) -> ResourceAmounts {
    ResourceAmounts::new(cpu, memory, storage)
}

pub(crate) fn make_zone(id: &str, quota: (i64, i64, i64)) -> Zone {
    Zone {
        id: id.to_string(),
        name: format!("{}-name", id),
        cluster_name: format!("{}-cluster", id),
        region: None,
        status: ZoneStatus::Available,
        capacity: ResourceAmounts::new(100, 400, 2000),
        quota: amounts(quota),
        labels: HashMap::new(),
        last_sync: Utc::now(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn make_vdc(
    org: &str,
    id: &str,
    zone: Option<&str>,
    resources: (i64, i64, i64),
    phase: VdcPhase,
) -> VirtualDataCenter {
    VirtualDataCenter {
        id: id.to_string(),
        name: id.to_string(),
        org_id: org.to_string(),
        zone_id: zone.map(str::to_string),
        resources: amounts(resources),
        phase,
        namespace: format!("vdc-{}-{}", org, id),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn make_quota(
    org: &str,
    zone: &str,
    quota: (i64, i64, i64),
    is_allowed: bool,
) -> OrgZoneQuota {
    OrgZoneQuota {
        org_id: org.to_string(),
        zone_id: zone.to_string(),
        quota: amounts(quota),
        is_allowed,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        zone: None,
    }
}

/// Zone `z1` (quota 80/320/1600) and `z2` (quota 40/160/800); `acme` holds
/// 40/160/800 in `z1` and already uses 20/80/400 there.
pub(crate) async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.create_zone(make_zone("z1", (80, 320, 1600))).await.unwrap();
    store.create_zone(make_zone("z2", (40, 160, 800))).await.unwrap();
    store
        .create_quota(make_quota("acme", "z1", (40, 160, 800), true))
        .await
        .unwrap();
    store
        .create_vdc(make_vdc("acme", "existing", Some("z1"), (20, 80, 400), VdcPhase::Active))
        .await
        .unwrap();
    store
}
