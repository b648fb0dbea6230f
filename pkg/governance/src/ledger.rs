use chrono::Utc;
use pkg_state::{QuotaStore, VdcStore, ZoneStore};
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::quota::{OrgZoneQuota, OrganizationZoneAccess};
use pkg_types::validate::{validate_amounts, validate_identifier};
use std::sync::Arc;
use tracing::{debug, info};

use crate::aggregate::aggregate_for_org;

/// The organization-zone quota ledger: one grant per `(org, zone)` pair.
///
/// Rows returned from reads carry their zone as a read-time join, so they
/// always reflect the zone's current state.
pub struct QuotaLedger<S: ?Sized> {
    store: Arc<S>,
}

/// Both halves of the key end up in a `/`-separated storage key, so they
/// must be plain identifiers.
fn require_key(quota: &OrgZoneQuota) -> GovernanceResult<()> {
    validate_identifier("organization id", &quota.org_id)?;
    validate_identifier("zone id", &quota.zone_id)
}

impl<S> QuotaLedger<S>
where
    S: ZoneStore + QuotaStore + VdcStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn join_zone(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        quota.zone = self.store.get_zone(&quota.zone_id).await?;
        Ok(quota)
    }

    pub async fn create(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        require_key(&quota)?;
        validate_amounts("quota", &quota.quota)?;
        if self.store.get_zone(&quota.zone_id).await?.is_none() {
            return Err(GovernanceError::InvalidInput(format!(
                "zone reference {} does not resolve",
                quota.zone_id
            )));
        }

        let now = Utc::now();
        quota.created_at = now;
        quota.updated_at = now;
        let created = self.store.create_quota(quota).await?;
        info!(
            "Granted org {} quota in zone {}: cpu={} memory={} storage={} allowed={}",
            created.org_id,
            created.zone_id,
            created.quota.cpu,
            created.quota.memory,
            created.quota.storage,
            created.is_allowed
        );
        self.join_zone(created).await
    }

    pub async fn get(&self, org_id: &str, zone_id: &str) -> GovernanceResult<OrgZoneQuota> {
        let quota = self.store.get_quota(org_id, zone_id).await?.ok_or_else(|| {
            GovernanceError::NotFound(format!("quota for org {} in zone {}", org_id, zone_id))
        })?;
        self.join_zone(quota).await
    }

    /// Rows of `org_id`, or every row when it is empty.
    pub async fn list(&self, org_id: &str) -> GovernanceResult<Vec<OrgZoneQuota>> {
        let filter = (!org_id.is_empty()).then_some(org_id);
        let rows = self.store.list_quotas(filter).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.join_zone(row).await?);
        }
        Ok(out)
    }

    /// Replace the numeric quota and allow flag. `created_at` is preserved.
    pub async fn update(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        require_key(&quota)?;
        validate_amounts("quota", &quota.quota)?;
        let existing = self
            .store
            .get_quota(&quota.org_id, &quota.zone_id)
            .await?
            .ok_or_else(|| {
                GovernanceError::NotFound(format!(
                    "quota for org {} in zone {}",
                    quota.org_id, quota.zone_id
                ))
            })?;

        quota.created_at = existing.created_at;
        quota.updated_at = Utc::now();
        let updated = self.store.update_quota(quota).await?;
        info!(
            "Updated org {} quota in zone {}: cpu={} memory={} storage={} allowed={}",
            updated.org_id,
            updated.zone_id,
            updated.quota.cpu,
            updated.quota.memory,
            updated.quota.storage,
            updated.is_allowed
        );
        self.join_zone(updated).await
    }

    pub async fn delete(&self, org_id: &str, zone_id: &str) -> GovernanceResult<()> {
        self.store.delete_quota(org_id, zone_id).await?;
        info!("Revoked org {} access to zone {}", org_id, zone_id);
        Ok(())
    }

    /// Each ledger row joined with the organization's live usage in that zone.
    /// Rows whose zone no longer resolves are skipped.
    pub async fn get_access(&self, org_id: &str) -> GovernanceResult<Vec<OrganizationZoneAccess>> {
        let filter = (!org_id.is_empty()).then_some(org_id);
        let rows = self.store.list_quotas(filter).await?;
        let mut out = Vec::with_capacity(rows.len());

        for row in rows {
            let Some(zone) = self.store.get_zone(&row.zone_id).await? else {
                debug!(
                    "Skipping quota of org {}: zone {} no longer exists",
                    row.org_id, row.zone_id
                );
                continue;
            };
            let vdcs = self
                .store
                .list_vdcs_by_org_and_zone(&row.org_id, &row.zone_id)
                .await?;
            let usage = aggregate_for_org(&row.org_id, &row.zone_id, &vdcs);

            out.push(OrganizationZoneAccess {
                org_id: row.org_id,
                zone_id: zone.id,
                zone_name: zone.name,
                zone_status: zone.status,
                quota: row.quota,
                is_allowed: row.is_allowed,
                used: usage.used,
                available: row.quota.saturating_sub(&usage.used).clamp_non_negative(),
                vdc_count: usage.vdc_count,
                active_vdc_count: usage.active_vdc_count,
            });
        }
        Ok(out)
    }
}
