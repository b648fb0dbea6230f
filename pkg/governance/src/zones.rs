use chrono::Utc;
use pkg_state::{VdcStore, ZoneStore};
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::validate::{validate_amounts, validate_identifier};
use pkg_types::zone::{Zone, ZoneSpec, ZoneSync};
use std::sync::Arc;
use tracing::{info, warn};

use crate::locks::ZoneLocks;

/// Zone registration, administrative updates and sync heartbeats.
///
/// Mutations of an existing zone take the same per-zone guard as VDC
/// provisioning, so a quota change, a heartbeat and a placement in one zone
/// never interleave.
pub struct ZoneRegistry<S: ?Sized> {
    store: Arc<S>,
    locks: ZoneLocks,
}

fn validate_spec(spec: &ZoneSpec) -> GovernanceResult<()> {
    validate_identifier("zone id", &spec.id)?;
    if spec.name.trim().is_empty() {
        return Err(GovernanceError::InvalidInput(
            "zone name must not be empty".to_string(),
        ));
    }
    validate_amounts("zone capacity", &spec.capacity)?;
    validate_amounts("zone quota", &spec.quota)?;
    Ok(())
}

impl<S> ZoneRegistry<S>
where
    S: ZoneStore + VdcStore + ?Sized,
{
    pub fn new(store: Arc<S>, locks: ZoneLocks) -> Self {
        Self { store, locks }
    }

    pub async fn register(&self, spec: ZoneSpec) -> GovernanceResult<Zone> {
        validate_spec(&spec)?;
        if spec.quota.cpu > spec.capacity.cpu
            || spec.quota.memory > spec.capacity.memory
            || spec.quota.storage > spec.capacity.storage
        {
            warn!(
                "Zone {} quota exceeds its capacity; available capacity will be negative",
                spec.id
            );
        }

        let now = Utc::now();
        let zone = Zone {
            id: spec.id,
            name: spec.name,
            cluster_name: spec.cluster_name,
            region: spec.region,
            status: spec.status,
            capacity: spec.capacity,
            quota: spec.quota,
            labels: spec.labels,
            last_sync: now,
            created_at: now,
            updated_at: now,
        };
        let zone = self.store.create_zone(zone).await?;
        info!("Registered zone {} ({})", zone.id, zone.name);
        Ok(zone)
    }

    pub async fn get(&self, zone_id: &str) -> GovernanceResult<Zone> {
        self.store
            .get_zone(zone_id)
            .await?
            .ok_or_else(|| GovernanceError::NotFound(format!("zone {}", zone_id)))
    }

    pub async fn list(&self) -> GovernanceResult<Vec<Zone>> {
        self.store.list_zones().await
    }

    /// Replace administrative fields. The id in `spec` must match `zone_id`.
    pub async fn update(&self, zone_id: &str, spec: ZoneSpec) -> GovernanceResult<Zone> {
        if spec.id != zone_id {
            return Err(GovernanceError::InvalidInput(format!(
                "zone id {} does not match path {}",
                spec.id, zone_id
            )));
        }
        validate_spec(&spec)?;
        let _guard = self.locks.lock(zone_id).await;
        let mut zone = self.get(zone_id).await?;
        zone.name = spec.name;
        zone.cluster_name = spec.cluster_name;
        zone.region = spec.region;
        zone.status = spec.status;
        zone.capacity = spec.capacity;
        zone.quota = spec.quota;
        zone.labels = spec.labels;
        zone.updated_at = Utc::now();
        let zone = self.store.update_zone(zone).await?;
        info!("Updated zone {} ({})", zone.id, zone.name);
        Ok(zone)
    }

    /// Apply a sync heartbeat: status and capacity only, quota untouched.
    pub async fn sync(&self, zone_id: &str, sync: ZoneSync) -> GovernanceResult<Zone> {
        if let Some(capacity) = &sync.capacity {
            validate_amounts("zone capacity", capacity)?;
        }
        let _guard = self.locks.lock(zone_id).await;
        let mut zone = self.get(zone_id).await?;
        if zone.status != sync.status {
            info!("Zone {} status: {} -> {}", zone.id, zone.status, sync.status);
        }
        zone.status = sync.status;
        if let Some(capacity) = sync.capacity {
            zone.capacity = capacity;
        }
        let now = Utc::now();
        zone.last_sync = now;
        zone.updated_at = now;
        self.store.update_zone(zone).await
    }

    /// Remove a zone. Refused while any VDC is still placed in it; the
    /// check and the delete run under the zone's guard so no VDC can be
    /// placed in between.
    pub async fn delete(&self, zone_id: &str) -> GovernanceResult<()> {
        let _guard = self.locks.lock(zone_id).await;
        self.get(zone_id).await?;
        let referencing = self.store.list_vdcs_by_zone(zone_id).await?;
        if !referencing.is_empty() {
            info!(
                "Refusing to delete zone {}: {} VDCs still placed there",
                zone_id,
                referencing.len()
            );
            return Err(GovernanceError::InUse(format!(
                "zone {} is still referenced by {} VDCs",
                zone_id,
                referencing.len()
            )));
        }
        self.store.delete_zone(zone_id).await?;
        info!("Deleted zone {}", zone_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_state::{MemoryStore, QuotaStore};
    use pkg_types::resources::ResourceAmounts;
    use crate::provision::Provisioner;
    use crate::testutil::{amounts, make_quota, make_vdc, seeded_store};
    use pkg_types::vdc::{CreateVdcRequest, VdcPhase};
    use pkg_types::zone::ZoneStatus;
    use std::collections::HashMap;
    use std::time::Duration;

    fn spec(id: &str, name: &str) -> ZoneSpec {
        ZoneSpec {
            id: id.to_string(),
            name: name.to_string(),
            cluster_name: "cluster-a".to_string(),
            region: Some("eu-west".to_string()),
            status: ZoneStatus::Available,
            capacity: ResourceAmounts::new(100, 400, 2000),
            quota: ResourceAmounts::new(80, 320, 1600),
            labels: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn sync_updates_status_and_capacity_not_quota() {
        let registry = ZoneRegistry::new(Arc::new(MemoryStore::new()), ZoneLocks::new());
        let zone = registry.register(spec("z1", "east")).await.unwrap();

        let synced = registry
            .sync(
                "z1",
                ZoneSync {
                    status: ZoneStatus::Maintenance,
                    capacity: Some(ResourceAmounts::new(120, 480, 2400)),
                },
            )
            .await
            .unwrap();
        assert_eq!(synced.status, ZoneStatus::Maintenance);
        assert_eq!(synced.capacity, ResourceAmounts::new(120, 480, 2400));
        assert_eq!(synced.quota, zone.quota);
        assert!(synced.last_sync >= zone.last_sync);
        assert_eq!(synced.created_at, zone.created_at);
    }

    #[tokio::test]
    async fn register_validates_and_enforces_unique_names() {
        let registry = ZoneRegistry::new(Arc::new(MemoryStore::new()), ZoneLocks::new());
        registry.register(spec("z1", "east")).await.unwrap();
        assert!(matches!(
            registry.register(spec("z2", "east")).await,
            Err(GovernanceError::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.register(spec("Bad_Id", "west")).await,
            Err(GovernanceError::InvalidInput(_))
        ));

        // Quota above capacity is stored as-is.
        let mut over = spec("z3", "north");
        over.quota = ResourceAmounts::new(200, 400, 2000);
        let zone = registry.register(over).await.unwrap();
        assert_eq!(zone.available_capacity().cpu, -100);
    }

    #[tokio::test]
    async fn missing_zone_is_not_found() {
        let registry = ZoneRegistry::new(Arc::new(MemoryStore::new()), ZoneLocks::new());
        assert!(matches!(
            registry.get("z1").await,
            Err(GovernanceError::NotFound(_))
        ));
        assert!(matches!(
            registry
                .sync(
                    "z1",
                    ZoneSync {
                        status: ZoneStatus::Available,
                        capacity: None
                    }
                )
                .await,
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sync_does_not_restore_a_stale_quota() {
        let store = seeded_store().await;
        let locks = ZoneLocks::new();
        let registry = Arc::new(ZoneRegistry::new(store.clone(), locks.clone()));

        let guard = locks.lock("z1").await;
        let pending = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .sync(
                        "z1",
                        ZoneSync {
                            status: ZoneStatus::Available,
                            capacity: None,
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        // An administrative quota cut lands while the heartbeat waits.
        let mut zone = store.get_zone("z1").await.unwrap().unwrap();
        zone.quota = amounts((10, 10, 10));
        store.update_zone(zone).await.unwrap();
        drop(guard);

        let synced = pending.await.unwrap().unwrap();
        assert_eq!(synced.quota, amounts((10, 10, 10)));
        assert_eq!(
            store.get_zone("z1").await.unwrap().unwrap().quota,
            amounts((10, 10, 10))
        );
    }

    #[tokio::test]
    async fn delete_is_refused_while_vdcs_are_placed() {
        let store = seeded_store().await;
        let registry = ZoneRegistry::new(store.clone(), ZoneLocks::new());

        assert!(matches!(
            registry.delete("z1").await,
            Err(GovernanceError::InUse(_))
        ));
        assert!(registry.get("z1").await.is_ok());

        registry.delete("z2").await.unwrap();
        assert!(matches!(
            registry.delete("z2").await,
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_waits_for_in_flight_placement() {
        let store = seeded_store().await;
        store
            .create_quota(make_quota("acme", "z2", (10, 10, 10), true))
            .await
            .unwrap();
        let locks = ZoneLocks::new();
        let registry = Arc::new(ZoneRegistry::new(store.clone(), locks.clone()));
        let provisioner = Provisioner::new(store.clone(), locks.clone());

        let guard = locks.lock("z2").await;
        let pending = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.delete("z2").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        // A VDC committed by a placement that held the guard first.
        store
            .create_vdc(make_vdc("acme", "late", Some("z2"), (1, 1, 1), VdcPhase::Pending))
            .await
            .unwrap();
        drop(guard);

        assert!(matches!(
            pending.await.unwrap(),
            Err(GovernanceError::InUse(_))
        ));
        assert!(registry.get("z2").await.is_ok());

        // Once the zone is empty again it can go, and later placements see it gone.
        provisioner.delete("acme", "late").await.unwrap();
        registry.delete("z2").await.unwrap();
        let err = provisioner
            .create(
                "acme",
                CreateVdcRequest {
                    name: "after".to_string(),
                    zone_id: "z2".to_string(),
                    resources: amounts((1, 1, 1)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::PolicyDenied(_)));
    }
}
