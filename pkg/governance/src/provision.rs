use chrono::Utc;
use pkg_state::{QuotaStore, VdcStore, ZoneStore};
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::namespace::vdc_namespace_name;
use pkg_types::resources::ResourceAmounts;
use pkg_types::validate::{validate_amounts, validate_identifier};
use pkg_types::vdc::{CreateVdcRequest, VdcPhase, VirtualDataCenter};
use std::sync::Arc;
use tracing::info;

use crate::locks::ZoneLocks;
use crate::placement::{Placement, PlacementDecision};

/// VDC lifecycle with placement enforced.
///
/// Every commit that changes a zone's usage runs under that zone's guard,
/// so the placement check and the write cannot interleave with another
/// caller's check and write in the same zone.
pub struct Provisioner<S: ?Sized> {
    store: Arc<S>,
    placement: Placement<S>,
    locks: ZoneLocks,
}

impl<S> Provisioner<S>
where
    S: ZoneStore + QuotaStore + VdcStore + ?Sized,
{
    pub fn new(store: Arc<S>, locks: ZoneLocks) -> Self {
        Self {
            placement: Placement::new(store.clone()),
            store,
            locks,
        }
    }

    pub fn placement(&self) -> &Placement<S> {
        &self.placement
    }

    pub async fn get(&self, org_id: &str, vdc_id: &str) -> GovernanceResult<VirtualDataCenter> {
        self.store
            .get_vdc(org_id, vdc_id)
            .await?
            .ok_or_else(|| GovernanceError::NotFound(format!("vdc {}/{}", org_id, vdc_id)))
    }

    pub async fn list(&self, org_id: &str) -> GovernanceResult<Vec<VirtualDataCenter>> {
        self.store.list_vdcs(Some(org_id)).await
    }

    /// Check placement and persist a new `Pending` VDC in one zone-serialized step.
    pub async fn create(
        &self,
        org_id: &str,
        req: CreateVdcRequest,
    ) -> GovernanceResult<VirtualDataCenter> {
        validate_identifier("organization id", org_id)?;
        validate_identifier("vdc name", &req.name)?;
        validate_identifier("zone id", &req.zone_id)?;

        let _guard = self.locks.lock(&req.zone_id).await;
        self.placement
            .accommodate(org_id, &req.zone_id, &req.resources)
            .await?
            .into_result()?;

        let now = Utc::now();
        let vdc = VirtualDataCenter {
            id: req.name.clone(),
            namespace: vdc_namespace_name(org_id, &req.name),
            name: req.name,
            org_id: org_id.to_string(),
            zone_id: Some(req.zone_id),
            resources: req.resources,
            phase: VdcPhase::Pending,
            created_at: now,
            updated_at: now,
        };
        let vdc = self.store.create_vdc(vdc).await?;
        info!(
            "Created vdc {}/{} in zone {}: cpu={} memory={} storage={}",
            vdc.org_id,
            vdc.id,
            vdc.zone_id.as_deref().unwrap_or_default(),
            vdc.resources.cpu,
            vdc.resources.memory,
            vdc.resources.storage
        );
        Ok(vdc)
    }

    /// Change a VDC's committed resources. Placed VDCs are re-checked with
    /// their own current commitment excluded.
    pub async fn resize(
        &self,
        org_id: &str,
        vdc_id: &str,
        resources: ResourceAmounts,
    ) -> GovernanceResult<VirtualDataCenter> {
        let current = self.get(org_id, vdc_id).await?;
        let Some(zone_id) = current.zone_id.clone() else {
            validate_amounts("request", &resources)?;
            return self.write_resize(current, resources).await;
        };

        let _guard = self.locks.lock(&zone_id).await;
        // Re-read under the guard; the VDC may have changed meanwhile.
        let current = self.get(org_id, vdc_id).await?;
        let decision = self
            .placement
            .accommodate_resize(org_id, &zone_id, vdc_id, &resources)
            .await?;
        if let PlacementDecision::Denied(denial) = decision {
            return Err(GovernanceError::PolicyDenied(denial));
        }
        self.write_resize(current, resources).await
    }

    async fn write_resize(
        &self,
        mut vdc: VirtualDataCenter,
        resources: ResourceAmounts,
    ) -> GovernanceResult<VirtualDataCenter> {
        vdc.resources = resources;
        vdc.updated_at = Utc::now();
        let vdc = self.store.update_vdc(vdc).await?;
        info!(
            "Resized vdc {}/{}: cpu={} memory={} storage={}",
            vdc.org_id, vdc.id, resources.cpu, resources.memory, resources.storage
        );
        Ok(vdc)
    }

    /// Lifecycle transition. Does not change committed resources.
    pub async fn set_phase(
        &self,
        org_id: &str,
        vdc_id: &str,
        phase: VdcPhase,
    ) -> GovernanceResult<VirtualDataCenter> {
        let vdc = self.get(org_id, vdc_id).await?;
        let _guard = match vdc.zone_id.as_deref() {
            Some(zone_id) => Some(self.locks.lock(zone_id).await),
            None => None,
        };
        // Re-read under the guard; a resize may have committed meanwhile.
        let mut vdc = self.get(org_id, vdc_id).await?;
        let previous = vdc.phase;
        vdc.phase = phase;
        vdc.updated_at = Utc::now();
        let vdc = self.store.update_vdc(vdc).await?;
        info!("vdc {}/{} phase: {} -> {}", org_id, vdc_id, previous, phase);
        Ok(vdc)
    }

    /// Remove a VDC; its usage disappears with the delete.
    pub async fn delete(&self, org_id: &str, vdc_id: &str) -> GovernanceResult<()> {
        let vdc = self.get(org_id, vdc_id).await?;
        let _guard = match vdc.zone_id.as_deref() {
            Some(zone_id) => Some(self.locks.lock(zone_id).await),
            None => None,
        };
        self.store.delete_vdc(org_id, vdc_id).await?;
        info!("Deleted vdc {}/{}", org_id, vdc_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::UtilizationAggregator;
    use crate::testutil::{amounts, make_vdc, seeded_store};
    use pkg_types::error::PlacementDenial;

    fn request(name: &str, resources: (i64, i64, i64)) -> CreateVdcRequest {
        CreateVdcRequest {
            name: name.to_string(),
            zone_id: "z1".to_string(),
            resources: amounts(resources),
        }
    }

    #[tokio::test]
    async fn create_places_pending_vdc_with_namespace() {
        let provisioner = Provisioner::new(seeded_store().await, ZoneLocks::new());
        let vdc = provisioner
            .create("acme", request("test", (15, 40, 200)))
            .await
            .unwrap();
        assert_eq!(vdc.phase, VdcPhase::Pending);
        assert_eq!(vdc.namespace, "vdc-acme-test");
        assert_eq!(vdc.zone_id.as_deref(), Some("z1"));
    }

    #[tokio::test]
    async fn create_surfaces_denial_reason() {
        let provisioner = Provisioner::new(seeded_store().await, ZoneLocks::new());
        let err = provisioner
            .create("acme", request("test", (25, 40, 200)))
            .await
            .unwrap_err();
        match err {
            GovernanceError::PolicyDenied(denial) => {
                assert_eq!(denial.code(), "organization_quota_exceeded")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn concurrent_creates_never_overcommit() {
        let store = seeded_store().await;
        let provisioner = Arc::new(Provisioner::new(store.clone(), ZoneLocks::new()));

        // acme has 20 cpu left; ten requests of 5 can fit only four times.
        let mut handles = Vec::new();
        for i in 0..10 {
            let provisioner = provisioner.clone();
            handles.push(tokio::spawn(async move {
                provisioner
                    .create("acme", request(&format!("burst-{}", i), (5, 1, 1)))
                    .await
            }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 4);

        let usage = UtilizationAggregator::new(store)
            .org_usage("acme", "z1")
            .await
            .unwrap();
        assert_eq!(usage.used.cpu, 40);
    }

    #[tokio::test]
    async fn resize_rechecks_without_double_counting() {
        let provisioner = Provisioner::new(seeded_store().await, ZoneLocks::new());
        let grown = provisioner
            .resize("acme", "existing", amounts((40, 160, 800)))
            .await
            .unwrap();
        assert_eq!(grown.resources, amounts((40, 160, 800)));

        let err = provisioner
            .resize("acme", "existing", amounts((41, 160, 800)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::PolicyDenied(PlacementDenial::OrganizationQuotaExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn unplaced_vdc_resizes_without_placement() {
        let store = seeded_store().await;
        store
            .create_vdc(make_vdc("acme", "legacy", None, (1, 1, 1), VdcPhase::Active))
            .await
            .unwrap();
        let provisioner = Provisioner::new(store, ZoneLocks::new());
        let vdc = provisioner
            .resize("acme", "legacy", amounts((500, 500, 500)))
            .await
            .unwrap();
        assert_eq!(vdc.resources.cpu, 500);
    }

    #[tokio::test]
    async fn delete_releases_usage() {
        let store = seeded_store().await;
        let provisioner = Provisioner::new(store.clone(), ZoneLocks::new());
        provisioner.delete("acme", "existing").await.unwrap();
        let usage = UtilizationAggregator::new(store)
            .zone_usage("z1")
            .await
            .unwrap();
        assert_eq!(usage.vdc_count, 0);
        assert!(matches!(
            provisioner.delete("acme", "existing").await,
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn phase_transition_keeps_resources() {
        let provisioner = Provisioner::new(seeded_store().await, ZoneLocks::new());
        let vdc = provisioner
            .set_phase("acme", "existing", VdcPhase::Terminating)
            .await
            .unwrap();
        assert_eq!(vdc.phase, VdcPhase::Terminating);
        assert_eq!(vdc.resources, amounts((20, 80, 400)));
    }

    #[tokio::test]
    async fn phase_change_does_not_undo_concurrent_resize() {
        let store = seeded_store().await;
        let locks = ZoneLocks::new();
        let provisioner = Arc::new(Provisioner::new(store.clone(), locks.clone()));

        let guard = locks.lock("z1").await;
        let pending = {
            let provisioner = provisioner.clone();
            tokio::spawn(async move {
                provisioner
                    .set_phase("acme", "existing", VdcPhase::Active)
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        // A resize commits while the phase change waits for the zone.
        let mut shrunk = store.get_vdc("acme", "existing").await.unwrap().unwrap();
        shrunk.resources = amounts((5, 20, 100));
        store.update_vdc(shrunk).await.unwrap();
        drop(guard);

        let vdc = pending.await.unwrap().unwrap();
        assert_eq!(vdc.resources, amounts((5, 20, 100)));

        // The freed headroom is really free: 5 + 35 fits the 40 cpu quota.
        provisioner
            .create("acme", request("second", (35, 10, 10)))
            .await
            .unwrap();
        let usage = UtilizationAggregator::new(store)
            .org_usage("acme", "z1")
            .await
            .unwrap();
        assert_eq!(usage.used.cpu, 40);
    }
}
