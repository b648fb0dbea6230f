use pkg_state::{QuotaStore, VdcStore, ZoneStore};
use pkg_types::error::{GovernanceError, GovernanceResult, PlacementDenial};
use pkg_types::quota::OrgZoneQuota;
use pkg_types::resources::ResourceAmounts;
use pkg_types::validate::validate_amounts;
use pkg_types::vdc::VirtualDataCenter;
use pkg_types::zone::Zone;
use std::sync::Arc;
use tracing::{debug, info};

use crate::aggregate::{aggregate, aggregate_for_org};

/// Outcome of a placement check. Valid only at the instant it was computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementDecision {
    Accepted,
    Denied(PlacementDenial),
}

impl PlacementDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PlacementDecision::Accepted)
    }

    /// Human-readable reason; empty when accepted.
    pub fn reason(&self) -> String {
        match self {
            PlacementDecision::Accepted => String::new(),
            PlacementDecision::Denied(denial) => denial.to_string(),
        }
    }

    pub fn into_result(self) -> GovernanceResult<()> {
        match self {
            PlacementDecision::Accepted => Ok(()),
            PlacementDecision::Denied(denial) => Err(GovernanceError::PolicyDenied(denial)),
        }
    }
}

/// Two-tier check once the zone and the ledger row are resolved.
///
/// The organization's ledger quota is the binding ceiling for `org_used`;
/// the zone quota is an independent outer ceiling for `zone_used`, which
/// sums every organization in the zone.
pub fn evaluate(
    zone: &Zone,
    ledger: &OrgZoneQuota,
    org_used: &ResourceAmounts,
    zone_used: &ResourceAmounts,
    request: &ResourceAmounts,
) -> PlacementDecision {
    if !zone.is_healthy() {
        return PlacementDecision::Denied(PlacementDenial::ZoneUnhealthy {
            zone_id: zone.id.clone(),
            status: zone.status.to_string(),
        });
    }
    if !ledger.is_allowed {
        return PlacementDecision::Denied(PlacementDenial::OrganizationNotPermitted {
            org_id: ledger.org_id.clone(),
            zone_id: zone.id.clone(),
        });
    }
    if let Some(resource) = ResourceAmounts::first_exceeding(request, org_used, &ledger.quota) {
        return PlacementDecision::Denied(PlacementDenial::OrganizationQuotaExceeded {
            resource,
            requested: request.get(resource),
            used: org_used.get(resource),
            quota: ledger.quota.get(resource),
        });
    }
    // Same predicate as `Zone::can_accommodate`; health was checked above.
    let over = ResourceAmounts::first_exceeding(request, zone_used, &zone.quota);
    debug_assert_eq!(zone.can_accommodate(request, zone_used), over.is_none());
    if let Some(resource) = over {
        return PlacementDecision::Denied(PlacementDenial::ZoneCapacityExceeded {
            resource,
            requested: request.get(resource),
            used: zone_used.get(resource),
            quota: zone.quota.get(resource),
        });
    }
    PlacementDecision::Accepted
}

/// Placement admission against live store state.
pub struct Placement<S: ?Sized> {
    store: Arc<S>,
}

impl<S> Placement<S>
where
    S: ZoneStore + QuotaStore + VdcStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Can `org_id` place a new VDC of size `request` in `zone_id`?
    pub async fn accommodate(
        &self,
        org_id: &str,
        zone_id: &str,
        request: &ResourceAmounts,
    ) -> GovernanceResult<PlacementDecision> {
        self.check(org_id, zone_id, request, None).await
    }

    /// Like [`Placement::accommodate`], for resizing an existing VDC: its own
    /// current commitment is left out of both usage sums.
    pub async fn accommodate_resize(
        &self,
        org_id: &str,
        zone_id: &str,
        vdc_id: &str,
        request: &ResourceAmounts,
    ) -> GovernanceResult<PlacementDecision> {
        self.check(org_id, zone_id, request, Some(vdc_id)).await
    }

    async fn check(
        &self,
        org_id: &str,
        zone_id: &str,
        request: &ResourceAmounts,
        exclude_vdc: Option<&str>,
    ) -> GovernanceResult<PlacementDecision> {
        if org_id.is_empty() || zone_id.is_empty() {
            return Err(GovernanceError::InvalidInput(
                "placement requires an organization and a zone".to_string(),
            ));
        }
        validate_amounts("request", request)?;

        let decision = self.resolve_and_evaluate(org_id, zone_id, request, exclude_vdc).await?;
        match &decision {
            PlacementDecision::Accepted => debug!(
                "Placement accepted: org={} zone={} cpu={} memory={} storage={}",
                org_id, zone_id, request.cpu, request.memory, request.storage
            ),
            PlacementDecision::Denied(denial) => info!(
                "Placement denied: org={} zone={} code={} reason={}",
                org_id,
                zone_id,
                denial.code(),
                denial
            ),
        }
        Ok(decision)
    }

    async fn resolve_and_evaluate(
        &self,
        org_id: &str,
        zone_id: &str,
        request: &ResourceAmounts,
        exclude_vdc: Option<&str>,
    ) -> GovernanceResult<PlacementDecision> {
        let Some(zone) = self.store.get_zone(zone_id).await? else {
            return Ok(PlacementDecision::Denied(PlacementDenial::ZoneNotFound {
                zone_id: zone_id.to_string(),
            }));
        };
        if !zone.is_healthy() {
            return Ok(PlacementDecision::Denied(PlacementDenial::ZoneUnhealthy {
                zone_id: zone.id.clone(),
                status: zone.status.to_string(),
            }));
        }

        let Some(ledger) = self.store.get_quota(org_id, zone_id).await? else {
            return Ok(PlacementDecision::Denied(
                PlacementDenial::OrganizationNotPermitted {
                    org_id: org_id.to_string(),
                    zone_id: zone_id.to_string(),
                },
            ));
        };

        // One read serves both tiers so they see the same snapshot.
        let vdcs: Vec<VirtualDataCenter> = self
            .store
            .list_vdcs_by_zone(zone_id)
            .await?
            .into_iter()
            .filter(|v| !(v.org_id == org_id && Some(v.id.as_str()) == exclude_vdc))
            .collect();
        let org_usage = aggregate_for_org(org_id, zone_id, &vdcs);
        let zone_usage = aggregate(zone_id, &vdcs);

        Ok(evaluate(
            &zone,
            &ledger,
            &org_usage.used,
            &zone_usage.used,
            request,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{amounts, make_quota, make_vdc, make_zone, seeded_store};
    use pkg_types::resources::Resource;
    use pkg_types::vdc::VdcPhase;
    use pkg_types::zone::ZoneStatus;

    #[tokio::test]
    async fn accepts_within_both_ceilings() {
        let placement = Placement::new(seeded_store().await);
        let decision = placement
            .accommodate("acme", "z1", &amounts((15, 40, 200)))
            .await
            .unwrap();
        assert_eq!(decision, PlacementDecision::Accepted);
        assert!(decision.reason().is_empty());
    }

    #[tokio::test]
    async fn org_quota_is_the_binding_ceiling() {
        let placement = Placement::new(seeded_store().await);
        let decision = placement
            .accommodate("acme", "z1", &amounts((25, 40, 200)))
            .await
            .unwrap();
        match decision {
            PlacementDecision::Denied(PlacementDenial::OrganizationQuotaExceeded {
                resource,
                requested,
                used,
                quota,
            }) => {
                assert_eq!(resource, Resource::Cpu);
                assert_eq!((requested, used, quota), (25, 20, 40));
            }
            other => panic!("unexpected decision {:?}", other),
        }
        let reason = placement
            .accommodate("acme", "z1", &amounts((25, 40, 200)))
            .await
            .unwrap()
            .reason();
        assert!(reason.starts_with("organization quota exceeded"));
    }

    #[tokio::test]
    async fn zone_capacity_denies_despite_org_headroom() {
        let store = seeded_store().await;
        // globex fills the zone; acme still has ledger headroom.
        store
            .create_quota(make_quota("globex", "z1", (80, 320, 1600), true))
            .await
            .unwrap();
        store
            .create_vdc(make_vdc("globex", "big", Some("z1"), (55, 100, 100), VdcPhase::Pending))
            .await
            .unwrap();
        let placement = Placement::new(store);

        let decision = placement
            .accommodate("acme", "z1", &amounts((10, 10, 10)))
            .await
            .unwrap();
        assert!(matches!(
            decision,
            PlacementDecision::Denied(PlacementDenial::ZoneCapacityExceeded {
                resource: Resource::Cpu,
                ..
            })
        ));
        assert!(decision.reason().starts_with("zone capacity exceeded"));
    }

    #[tokio::test]
    async fn missing_or_unhealthy_zone_is_unavailable() {
        let store = seeded_store().await;
        let placement = Placement::new(store.clone());
        let decision = placement
            .accommodate("acme", "nowhere", &amounts((1, 1, 1)))
            .await
            .unwrap();
        assert!(matches!(
            decision,
            PlacementDecision::Denied(PlacementDenial::ZoneNotFound { .. })
        ));

        let mut zone = store.get_zone("z1").await.unwrap().unwrap();
        zone.status = ZoneStatus::Maintenance;
        store.update_zone(zone).await.unwrap();
        let decision = placement
            .accommodate("acme", "z1", &amounts((0, 0, 0)))
            .await
            .unwrap();
        assert!(matches!(
            decision,
            PlacementDecision::Denied(PlacementDenial::ZoneUnhealthy { .. })
        ));
        assert!(decision.reason().starts_with("zone unavailable"));
    }

    #[tokio::test]
    async fn missing_or_denied_ledger_row_is_not_permitted() {
        let store = seeded_store().await;
        let placement = Placement::new(store.clone());
        let decision = placement
            .accommodate("globex", "z1", &amounts((1, 1, 1)))
            .await
            .unwrap();
        assert!(matches!(
            decision,
            PlacementDecision::Denied(PlacementDenial::OrganizationNotPermitted { .. })
        ));

        store
            .update_quota(make_quota("acme", "z1", (40, 160, 800), false))
            .await
            .unwrap();
        let decision = placement
            .accommodate("acme", "z1", &amounts((1, 1, 1)))
            .await
            .unwrap();
        assert!(decision.reason().starts_with("organization not permitted in zone"));
    }

    #[tokio::test]
    async fn resize_excludes_own_commitment() {
        let placement = Placement::new(seeded_store().await);
        // 40 cpu total would exceed 40 - 20 used if counted twice.
        let decision = placement
            .accommodate_resize("acme", "z1", "existing", &amounts((40, 160, 800)))
            .await
            .unwrap();
        assert!(decision.is_accepted());
        let decision = placement
            .accommodate_resize("acme", "z1", "existing", &amounts((41, 160, 800)))
            .await
            .unwrap();
        assert!(!decision.is_accepted());
    }

    #[tokio::test]
    async fn negative_request_is_invalid() {
        let placement = Placement::new(seeded_store().await);
        assert!(matches!(
            placement
                .accommodate("acme", "z1", &amounts((-1, 0, 0)))
                .await,
            Err(GovernanceError::InvalidInput(_))
        ));
    }

    #[test]
    fn evaluate_checks_each_resource() {
        let zone = make_zone("z1", (80, 320, 1600));
        let ledger = make_quota("acme", "z1", (40, 160, 800), true);
        let used = amounts((20, 80, 400));
        assert!(evaluate(&zone, &ledger, &used, &used, &amounts((20, 80, 400))).is_accepted());
        assert!(matches!(
            evaluate(&zone, &ledger, &used, &used, &amounts((0, 0, 401))),
            PlacementDecision::Denied(PlacementDenial::OrganizationQuotaExceeded {
                resource: Resource::Storage,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn corrupt_vdc_row_fails_instead_of_undercounting() {
        use pkg_constants::state::VDCS_PREFIX;
        use pkg_state::SlateStore;
        use pkg_state::client::StateStore;

        let dir = tempfile::tempdir().unwrap();
        let kv = StateStore::new(dir.path().to_str().unwrap()).await.unwrap();
        let store = Arc::new(SlateStore::from_state(kv.clone()));
        store.create_zone(make_zone("z1", (80, 320, 1600))).await.unwrap();
        store
            .create_quota(make_quota("acme", "z1", (40, 160, 800), true))
            .await
            .unwrap();
        store
            .create_vdc(make_vdc("acme", "big", Some("z1"), (30, 10, 10), VdcPhase::Active))
            .await
            .unwrap();
        kv.put(&format!("{}acme/big", VDCS_PREFIX), br#"{"phase":"Suspended"}"#)
            .await
            .unwrap();

        let placement = Placement::new(store);
        let result = placement.accommodate("acme", "z1", &amounts((20, 10, 10))).await;
        assert!(matches!(result, Err(GovernanceError::Store(_))));
    }
}
