use pkg_state::{VdcStore, ZoneStore};
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::utilization::{ResourceUsage, ZoneUtilization};
use pkg_types::vdc::VirtualDataCenter;
use pkg_types::zone::Zone;
use std::sync::Arc;
use tracing::debug;

fn sum<'a>(vdcs: impl Iterator<Item = &'a VirtualDataCenter>) -> ResourceUsage {
    vdcs.fold(ResourceUsage::default(), |mut acc, vdc| {
        acc.used = acc.used.saturating_add(&vdc.resources);
        acc.vdc_count += 1;
        if vdc.is_active() {
            acc.active_vdc_count += 1;
        }
        acc
    })
}

/// Sum the commitment of every VDC assigned to `zone_id`, whatever its phase.
/// Unassigned VDCs contribute nothing.
pub fn aggregate(zone_id: &str, vdcs: &[VirtualDataCenter]) -> ResourceUsage {
    sum(vdcs.iter().filter(|v| v.is_in_zone(zone_id)))
}

/// Same as [`aggregate`], restricted to VDCs owned by `org_id`.
pub fn aggregate_for_org(org_id: &str, zone_id: &str, vdcs: &[VirtualDataCenter]) -> ResourceUsage {
    sum(vdcs
        .iter()
        .filter(|v| v.org_id == org_id && v.is_in_zone(zone_id)))
}

/// Combine a zone with its aggregated usage.
pub fn zone_utilization(zone: &Zone, vdcs: &[VirtualDataCenter]) -> ZoneUtilization {
    let usage = aggregate(&zone.id, vdcs);
    ZoneUtilization {
        zone_id: zone.id.clone(),
        zone_name: zone.name.clone(),
        status: zone.status,
        capacity: zone.capacity,
        quota: zone.quota,
        used: usage.used,
        utilization: zone.utilization_percentage(&usage.used),
        vdc_count: usage.vdc_count,
        active_vdc_count: usage.active_vdc_count,
        last_sync: zone.last_sync,
    }
}

/// Store-backed aggregation. Every call rescans the store; nothing is cached.
pub struct UtilizationAggregator<S: ?Sized> {
    store: Arc<S>,
}

impl<S> UtilizationAggregator<S>
where
    S: ZoneStore + VdcStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn zone_usage(&self, zone_id: &str) -> GovernanceResult<ResourceUsage> {
        let vdcs = self.store.list_vdcs_by_zone(zone_id).await?;
        Ok(aggregate(zone_id, &vdcs))
    }

    pub async fn org_usage(&self, org_id: &str, zone_id: &str) -> GovernanceResult<ResourceUsage> {
        let vdcs = self.store.list_vdcs_by_org_and_zone(org_id, zone_id).await?;
        Ok(aggregate_for_org(org_id, zone_id, &vdcs))
    }

    pub async fn zone_utilization(&self, zone_id: &str) -> GovernanceResult<ZoneUtilization> {
        let zone = self
            .store
            .get_zone(zone_id)
            .await?
            .ok_or_else(|| GovernanceError::NotFound(format!("zone {}", zone_id)))?;
        let vdcs = self.store.list_vdcs_by_zone(zone_id).await?;
        Ok(zone_utilization(&zone, &vdcs))
    }

    /// Utilization of every zone, one scan per zone.
    pub async fn all_zone_utilization(&self) -> GovernanceResult<Vec<ZoneUtilization>> {
        let zones = self.store.list_zones().await?;
        let mut out = Vec::with_capacity(zones.len());
        for zone in &zones {
            let vdcs = self.store.list_vdcs_by_zone(&zone.id).await?;
            out.push(zone_utilization(zone, &vdcs));
        }
        debug!("Computed utilization for {} zones", out.len());
        Ok(out)
    }
}
