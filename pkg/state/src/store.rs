use async_trait::async_trait;
use pkg_types::error::GovernanceResult;
use pkg_types::namespace::Namespace;
use pkg_types::quota::OrgZoneQuota;
use pkg_types::vdc::VirtualDataCenter;
use pkg_types::zone::Zone;

/// Zones, unique by `id` and by `name`.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Fails with `AlreadyExists` on a duplicate id or name.
    async fn create_zone(&self, zone: Zone) -> GovernanceResult<Zone>;
    async fn get_zone(&self, zone_id: &str) -> GovernanceResult<Option<Zone>>;
    async fn list_zones(&self) -> GovernanceResult<Vec<Zone>>;
    /// Fails with `NotFound` if absent, `AlreadyExists` if renamed onto
    /// another zone's name.
    async fn update_zone(&self, zone: Zone) -> GovernanceResult<Zone>;
    async fn delete_zone(&self, zone_id: &str) -> GovernanceResult<()>;
}

/// Organization-zone ledger rows, unique by `(org_id, zone_id)`.
/// Rows are stored without their zone join.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Fails with `AlreadyExists` if the pair already has a row.
    async fn create_quota(&self, quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota>;
    async fn get_quota(&self, org_id: &str, zone_id: &str)
    -> GovernanceResult<Option<OrgZoneQuota>>;
    /// All rows of `org_id`, or every row when `None`.
    async fn list_quotas(&self, org_id: Option<&str>) -> GovernanceResult<Vec<OrgZoneQuota>>;
    /// Fails with `NotFound` if the pair has no row.
    async fn update_quota(&self, quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota>;
    async fn delete_quota(&self, org_id: &str, zone_id: &str) -> GovernanceResult<()>;
}

/// VDC records. Reads reflect committed state at call time.
#[async_trait]
pub trait VdcStore: Send + Sync {
    async fn create_vdc(&self, vdc: VirtualDataCenter) -> GovernanceResult<VirtualDataCenter>;
    async fn get_vdc(&self, org_id: &str, vdc_id: &str)
    -> GovernanceResult<Option<VirtualDataCenter>>;
    /// All VDCs of `org_id`, or every VDC when `None`.
    async fn list_vdcs(&self, org_id: Option<&str>) -> GovernanceResult<Vec<VirtualDataCenter>>;
    async fn list_vdcs_by_zone(&self, zone_id: &str) -> GovernanceResult<Vec<VirtualDataCenter>>;
    async fn list_vdcs_by_org_and_zone(
        &self,
        org_id: &str,
        zone_id: &str,
    ) -> GovernanceResult<Vec<VirtualDataCenter>>;
    async fn update_vdc(&self, vdc: VirtualDataCenter) -> GovernanceResult<VirtualDataCenter>;
    async fn delete_vdc(&self, org_id: &str, vdc_id: &str) -> GovernanceResult<()>;
}

/// Live namespace lookup used by the admission webhook.
#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    /// `Ok(None)` when the namespace does not exist.
    async fn get_namespace(&self, name: &str) -> anyhow::Result<Option<Namespace>>;
}

/// Namespace persistence for the API's own namespace endpoint.
#[async_trait]
pub trait NamespaceStore: NamespaceLookup {
    async fn create_namespace(&self, ns: Namespace) -> GovernanceResult<Namespace>;
    async fn list_namespaces(&self) -> GovernanceResult<Vec<Namespace>>;
    async fn delete_namespace(&self, name: &str) -> GovernanceResult<()>;
}

/// Everything the API server needs from one backend.
pub trait GovernanceStore: ZoneStore + QuotaStore + VdcStore + NamespaceStore {}

impl<T> GovernanceStore for T where T: ZoneStore + QuotaStore + VdcStore + NamespaceStore {}
