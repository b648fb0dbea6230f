use async_trait::async_trait;
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::namespace::Namespace;
use pkg_types::quota::OrgZoneQuota;
use pkg_types::vdc::VirtualDataCenter;
use pkg_types::zone::Zone;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{NamespaceLookup, NamespaceStore, QuotaStore, VdcStore, ZoneStore};

/// In-memory backend. A single lock covers all collections, so every
/// uniqueness check and its insert happen atomically.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    zones: BTreeMap<String, Zone>,
    /// Keyed by `(org_id, zone_id)`.
    quotas: BTreeMap<(String, String), OrgZoneQuota>,
    /// Keyed by `(org_id, vdc_id)`.
    vdcs: BTreeMap<(String, String), VirtualDataCenter>,
    namespaces: BTreeMap<String, Namespace>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn quota_key(org_id: &str, zone_id: &str) -> (String, String) {
    (org_id.to_string(), zone_id.to_string())
}

#[async_trait]
impl ZoneStore for MemoryStore {
    async fn create_zone(&self, zone: Zone) -> GovernanceResult<Zone> {
        let mut inner = self.inner.write().await;
        if inner.zones.contains_key(&zone.id) {
            return Err(GovernanceError::AlreadyExists(format!("zone {}", zone.id)));
        }
        if inner.zones.values().any(|z| z.name == zone.name) {
            return Err(GovernanceError::AlreadyExists(format!(
                "zone name {}",
                zone.name
            )));
        }
        inner.zones.insert(zone.id.clone(), zone.clone());
        Ok(zone)
    }

    async fn get_zone(&self, zone_id: &str) -> GovernanceResult<Option<Zone>> {
        Ok(self.inner.read().await.zones.get(zone_id).cloned())
    }

    async fn list_zones(&self) -> GovernanceResult<Vec<Zone>> {
        Ok(self.inner.read().await.zones.values().cloned().collect())
    }

    async fn update_zone(&self, zone: Zone) -> GovernanceResult<Zone> {
        let mut inner = self.inner.write().await;
        if !inner.zones.contains_key(&zone.id) {
            return Err(GovernanceError::NotFound(format!("zone {}", zone.id)));
        }
        if inner
            .zones
            .values()
            .any(|z| z.id != zone.id && z.name == zone.name)
        {
            return Err(GovernanceError::AlreadyExists(format!(
                "zone name {}",
                zone.name
            )));
        }
        inner.zones.insert(zone.id.clone(), zone.clone());
        Ok(zone)
    }

    async fn delete_zone(&self, zone_id: &str) -> GovernanceResult<()> {
        match self.inner.write().await.zones.remove(zone_id) {
            Some(_) => Ok(()),
            None => Err(GovernanceError::NotFound(format!("zone {}", zone_id))),
        }
    }
}

#[async_trait]
impl QuotaStore for MemoryStore {
    async fn create_quota(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        quota.zone = None;
        let key = quota_key(&quota.org_id, &quota.zone_id);
        let mut inner = self.inner.write().await;
        if inner.quotas.contains_key(&key) {
            return Err(GovernanceError::AlreadyExists(format!(
                "quota for org {} in zone {}",
                quota.org_id, quota.zone_id
            )));
        }
        inner.quotas.insert(key, quota.clone());
        Ok(quota)
    }

    async fn get_quota(
        &self,
        org_id: &str,
        zone_id: &str,
    ) -> GovernanceResult<Option<OrgZoneQuota>> {
        Ok(self
            .inner
            .read()
            .await
            .quotas
            .get(&quota_key(org_id, zone_id))
            .cloned())
    }

    async fn list_quotas(&self, org_id: Option<&str>) -> GovernanceResult<Vec<OrgZoneQuota>> {
        Ok(self
            .inner
            .read()
            .await
            .quotas
            .values()
            .filter(|q| org_id.is_none_or(|org| q.org_id == org))
            .cloned()
            .collect())
    }

    async fn update_quota(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        quota.zone = None;
        let key = quota_key(&quota.org_id, &quota.zone_id);
        let mut inner = self.inner.write().await;
        match inner.quotas.get_mut(&key) {
            Some(existing) => {
                *existing = quota.clone();
                Ok(quota)
            }
            None => Err(GovernanceError::NotFound(format!(
                "quota for org {} in zone {}",
                quota.org_id, quota.zone_id
            ))),
        }
    }

    async fn delete_quota(&self, org_id: &str, zone_id: &str) -> GovernanceResult<()> {
        match self
            .inner
            .write()
            .await
            .quotas
            .remove(&quota_key(org_id, zone_id))
        {
            Some(_) => Ok(()),
            None => Err(GovernanceError::NotFound(format!(
                "quota for org {} in zone {}",
                org_id, zone_id
            ))),
        }
    }
}

#[async_trait]
impl VdcStore for MemoryStore {
    async fn create_vdc(&self, vdc: VirtualDataCenter) -> GovernanceResult<VirtualDataCenter> {
        let key = (vdc.org_id.clone(), vdc.id.clone());
        let mut inner = self.inner.write().await;
        if inner.vdcs.contains_key(&key) {
            return Err(GovernanceError::AlreadyExists(format!(
                "vdc {}/{}",
                vdc.org_id, vdc.id
            )));
        }
        inner.vdcs.insert(key, vdc.clone());
        Ok(vdc)
    }

    async fn get_vdc(
        &self,
        org_id: &str,
        vdc_id: &str,
    ) -> GovernanceResult<Option<VirtualDataCenter>> {
        Ok(self
            .inner
            .read()
            .await
            .vdcs
            .get(&(org_id.to_string(), vdc_id.to_string()))
            .cloned())
    }

    async fn list_vdcs(&self, org_id: Option<&str>) -> GovernanceResult<Vec<VirtualDataCenter>> {
        Ok(self
            .inner
            .read()
            .await
            .vdcs
            .values()
            .filter(|v| org_id.is_none_or(|org| v.org_id == org))
            .cloned()
            .collect())
    }

    async fn list_vdcs_by_zone(&self, zone_id: &str) -> GovernanceResult<Vec<VirtualDataCenter>> {
        Ok(self
            .inner
            .read()
            .await
            .vdcs
            .values()
            .filter(|v| v.is_in_zone(zone_id))
            .cloned()
            .collect())
    }

    async fn list_vdcs_by_org_and_zone(
        &self,
        org_id: &str,
        zone_id: &str,
    ) -> GovernanceResult<Vec<VirtualDataCenter>> {
        Ok(self
            .inner
            .read()
            .await
            .vdcs
            .values()
            .filter(|v| v.org_id == org_id && v.is_in_zone(zone_id))
            .cloned()
            .collect())
    }

    async fn update_vdc(&self, vdc: VirtualDataCenter) -> GovernanceResult<VirtualDataCenter> {
        let key = (vdc.org_id.clone(), vdc.id.clone());
        let mut inner = self.inner.write().await;
        match inner.vdcs.get_mut(&key) {
            Some(existing) => {
                *existing = vdc.clone();
                Ok(vdc)
            }
            None => Err(GovernanceError::NotFound(format!(
                "vdc {}/{}",
                vdc.org_id, vdc.id
            ))),
        }
    }

    async fn delete_vdc(&self, org_id: &str, vdc_id: &str) -> GovernanceResult<()> {
        match self
            .inner
            .write()
            .await
            .vdcs
            .remove(&(org_id.to_string(), vdc_id.to_string()))
        {
            Some(_) => Ok(()),
            None => Err(GovernanceError::NotFound(format!(
                "vdc {}/{}",
                org_id, vdc_id
            ))),
        }
    }
}

#[async_trait]
impl NamespaceLookup for MemoryStore {
    async fn get_namespace(&self, name: &str) -> anyhow::Result<Option<Namespace>> {
        Ok(self.inner.read().await.namespaces.get(name).cloned())
    }
}

#[async_trait]
impl NamespaceStore for MemoryStore {
    async fn create_namespace(&self, ns: Namespace) -> GovernanceResult<Namespace> {
        let mut inner = self.inner.write().await;
        if inner.namespaces.contains_key(&ns.name) {
            return Err(GovernanceError::AlreadyExists(format!(
                "namespace {}",
                ns.name
            )));
        }
        inner.namespaces.insert(ns.name.clone(), ns.clone());
        Ok(ns)
    }

    async fn list_namespaces(&self) -> GovernanceResult<Vec<Namespace>> {
        Ok(self.inner.read().await.namespaces.values().cloned().collect())
    }

    async fn delete_namespace(&self, name: &str) -> GovernanceResult<()> {
        match self.inner.write().await.namespaces.remove(name) {
            Some(_) => Ok(()),
            None => Err(GovernanceError::NotFound(format!("namespace {}", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pkg_types::resources::ResourceAmounts;
    use pkg_types::zone::ZoneStatus;
    use std::collections::HashMap;

    fn zone(id: &str, name: &str) -> Zone {
        Zone {
            id: id.to_string(),
            name: name.to_string(),
            cluster_name: String::new(),
            region: None,
            status: ZoneStatus::Available,
            capacity: ResourceAmounts::default(),
            quota: ResourceAmounts::default(),
            labels: HashMap::new(),
            last_sync: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn quota(org: &str, zone: &str) -> OrgZoneQuota {
        OrgZoneQuota {
            org_id: org.to_string(),
            zone_id: zone.to_string(),
            quota: ResourceAmounts::new(1, 1, 1),
            is_allowed: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            zone: None,
        }
    }

    #[tokio::test]
    async fn zone_names_are_unique() {
        let store = MemoryStore::new();
        store.create_zone(zone("z1", "east")).await.unwrap();
        let err = store.create_zone(zone("z2", "east")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyExists(_)));

        store.create_zone(zone("z2", "west")).await.unwrap();
        let err = store.update_zone(zone("z2", "east")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyExists(_)));
        // Keeping its own name is not a conflict.
        store.update_zone(zone("z2", "west")).await.unwrap();
    }

    #[tokio::test]
    async fn quota_pairs_are_unique() {
        let store = MemoryStore::new();
        store.create_quota(quota("acme", "z1")).await.unwrap();
        store.create_quota(quota("acme", "z2")).await.unwrap();
        let err = store.create_quota(quota("acme", "z1")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyExists(_)));
        assert_eq!(store.list_quotas(Some("acme")).await.unwrap().len(), 2);
        assert_eq!(store.list_quotas(Some("other")).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_quota(quota("acme", "z1")).await,
            Err(GovernanceError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_quota("acme", "z1").await,
            Err(GovernanceError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_zone("z1").await,
            Err(GovernanceError::NotFound(_))
        ));
    }
}
