use async_trait::async_trait;
use pkg_constants::state::{NAMESPACES_PREFIX, ORG_ZONE_QUOTAS_PREFIX, VDCS_PREFIX, ZONES_PREFIX};
use pkg_types::error::{GovernanceError, GovernanceResult};
use pkg_types::namespace::Namespace;
use pkg_types::quota::OrgZoneQuota;
use pkg_types::vdc::VirtualDataCenter;
use pkg_types::zone::Zone;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::StateStore;
use crate::store::{NamespaceLookup, NamespaceStore, QuotaStore, VdcStore, ZoneStore};

/// SlateDB backend. Values are JSON under `/registry/...` keys.
///
/// SlateDB has no unique constraints, so every mutation takes `write_lock`
/// to make the existence check and the write one step.
#[derive(Clone)]
pub struct SlateStore {
    kv: StateStore,
    write_lock: Arc<Mutex<()>>,
}

fn zone_key(zone_id: &str) -> String {
    format!("{}{}", ZONES_PREFIX, zone_id)
}

fn quota_key(org_id: &str, zone_id: &str) -> String {
    format!("{}{}/{}", ORG_ZONE_QUOTAS_PREFIX, org_id, zone_id)
}

fn vdc_key(org_id: &str, vdc_id: &str) -> String {
    format!("{}{}/{}", VDCS_PREFIX, org_id, vdc_id)
}

fn namespace_key(name: &str) -> String {
    format!("{}{}", NAMESPACES_PREFIX, name)
}

/// Prefix scans must end in `/` so that org `acme` does not match `acme-2`.
fn org_prefix(base: &str, org_id: &str) -> String {
    format!("{}{}/", base, org_id)
}

impl SlateStore {
    pub async fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self::from_state(StateStore::new(path).await?))
    }

    pub fn from_state(kv: StateStore) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn remove(&self, key: &str, what: String) -> GovernanceResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.kv.get(key).await?.is_none() {
            return Err(GovernanceError::NotFound(what));
        }
        self.kv.delete(key).await?;
        Ok(())
    }
}

#[async_trait]
impl ZoneStore for SlateStore {
    async fn create_zone(&self, zone: Zone) -> GovernanceResult<Zone> {
        let _guard = self.write_lock.lock().await;
        let key = zone_key(&zone.id);
        if self.kv.get(&key).await?.is_some() {
            return Err(GovernanceError::AlreadyExists(format!("zone {}", zone.id)));
        }
        let zones: Vec<Zone> = self.kv.list_json(ZONES_PREFIX).await?;
        if zones.iter().any(|z| z.name == zone.name) {
            return Err(GovernanceError::AlreadyExists(format!(
                "zone name {}",
                zone.name
            )));
        }
        self.kv.put_json(&key, &zone).await?;
        Ok(zone)
    }

    async fn get_zone(&self, zone_id: &str) -> GovernanceResult<Option<Zone>> {
        Ok(self.kv.get_json(&zone_key(zone_id)).await?)
    }

    async fn list_zones(&self) -> GovernanceResult<Vec<Zone>> {
        Ok(self.kv.list_json(ZONES_PREFIX).await?)
    }

    async fn update_zone(&self, zone: Zone) -> GovernanceResult<Zone> {
        let _guard = self.write_lock.lock().await;
        let key = zone_key(&zone.id);
        if self.kv.get(&key).await?.is_none() {
            return Err(GovernanceError::NotFound(format!("zone {}", zone.id)));
        }
        let zones: Vec<Zone> = self.kv.list_json(ZONES_PREFIX).await?;
        if zones.iter().any(|z| z.id != zone.id && z.name == zone.name) {
            return Err(GovernanceError::AlreadyExists(format!(
                "zone name {}",
                zone.name
            )));
        }
        self.kv.put_json(&key, &zone).await?;
        Ok(zone)
    }

    async fn delete_zone(&self, zone_id: &str) -> GovernanceResult<()> {
        self.remove(&zone_key(zone_id), format!("zone {}", zone_id))
            .await
    }
}

#[async_trait]
impl QuotaStore for SlateStore {
    async fn create_quota(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        quota.zone = None;
        let _guard = self.write_lock.lock().await;
        let key = quota_key(&quota.org_id, &quota.zone_id);
        if self.kv.get(&key).await?.is_some() {
            return Err(GovernanceError::AlreadyExists(format!(
                "quota for org {} in zone {}",
                quota.org_id, quota.zone_id
            )));
        }
        self.kv.put_json(&key, &quota).await?;
        Ok(quota)
    }

    async fn get_quota(
        &self,
        org_id: &str,
        zone_id: &str,
    ) -> GovernanceResult<Option<OrgZoneQuota>> {
        Ok(self.kv.get_json(&quota_key(org_id, zone_id)).await?)
    }

    async fn list_quotas(&self, org_id: Option<&str>) -> GovernanceResult<Vec<OrgZoneQuota>> {
        let prefix = match org_id {
            Some(org) => org_prefix(ORG_ZONE_QUOTAS_PREFIX, org),
            None => ORG_ZONE_QUOTAS_PREFIX.to_string(),
        };
        Ok(self.kv.list_json(&prefix).await?)
    }

    async fn update_quota(&self, mut quota: OrgZoneQuota) -> GovernanceResult<OrgZoneQuota> {
        quota.zone = None;
        let _guard = self.write_lock.lock().await;
        let key = quota_key(&quota.org_id, &quota.zone_id);
        if self.kv.get(&key).await?.is_none() {
            return Err(GovernanceError::NotFound(format!(
                "quota for org {} in zone {}",
                quota.org_id, quota.zone_id
            )));
        }
        self.kv.put_json(&key, &quota).await?;
        Ok(quota)
    }

    async fn delete_quota(&self, org_id: &str, zone_id: &str) -> GovernanceResult<()> {
        self.remove(
            &quota_key(org_id, zone_id),
            format!("quota for org {} in zone {}", org_id, zone_id),
        )
        .await
    }
}

#[async_trait]
impl VdcStore for SlateStore {
    async fn create_vdc(&self, vdc: VirtualDataCenter) -> GovernanceResult<VirtualDataCenter> {
        let _guard = self.write_lock.lock().await;
        let key = vdc_key(&vdc.org_id, &vdc.id);
        if self.kv.get(&key).await?.is_some() {
            return Err(GovernanceError::AlreadyExists(format!(
                "vdc {}/{}",
                vdc.org_id, vdc.id
            )));
        }
        self.kv.put_json(&key, &vdc).await?;
        Ok(vdc)
    }

    async fn get_vdc(
        &self,
        org_id: &str,
        vdc_id: &str,
    ) -> GovernanceResult<Option<VirtualDataCenter>> {
        Ok(self.kv.get_json(&vdc_key(org_id, vdc_id)).await?)
    }

    async fn list_vdcs(&self, org_id: Option<&str>) -> GovernanceResult<Vec<VirtualDataCenter>> {
        let prefix = match org_id {
            Some(org) => org_prefix(VDCS_PREFIX, org),
            None => VDCS_PREFIX.to_string(),
        };
        Ok(self.kv.list_json(&prefix).await?)
    }

    async fn list_vdcs_by_zone(&self, zone_id: &str) -> GovernanceResult<Vec<VirtualDataCenter>> {
        let vdcs: Vec<VirtualDataCenter> = self.kv.list_json(VDCS_PREFIX).await?;
        Ok(vdcs.into_iter().filter(|v| v.is_in_zone(zone_id)).collect())
    }

    async fn list_vdcs_by_org_and_zone(
        &self,
        org_id: &str,
        zone_id: &str,
    ) -> GovernanceResult<Vec<VirtualDataCenter>> {
        let vdcs: Vec<VirtualDataCenter> =
            self.kv.list_json(&org_prefix(VDCS_PREFIX, org_id)).await?;
        Ok(vdcs.into_iter().filter(|v| v.is_in_zone(zone_id)).collect())
    }

    async fn update_vdc(&self, vdc: VirtualDataCenter) -> GovernanceResult<VirtualDataCenter> {
        let _guard = self.write_lock.lock().await;
        let key = vdc_key(&vdc.org_id, &vdc.id);
        if self.kv.get(&key).await?.is_none() {
            return Err(GovernanceError::NotFound(format!(
                "vdc {}/{}",
                vdc.org_id, vdc.id
            )));
        }
        self.kv.put_json(&key, &vdc).await?;
        Ok(vdc)
    }

    async fn delete_vdc(&self, org_id: &str, vdc_id: &str) -> GovernanceResult<()> {
        self.remove(
            &vdc_key(org_id, vdc_id),
            format!("vdc {}/{}", org_id, vdc_id),
        )
        .await
    }
}

#[async_trait]
impl NamespaceLookup for SlateStore {
    async fn get_namespace(&self, name: &str) -> anyhow::Result<Option<Namespace>> {
        self.kv.get_json(&namespace_key(name)).await
    }
}

#[async_trait]
impl NamespaceStore for SlateStore {
    async fn create_namespace(&self, ns: Namespace) -> GovernanceResult<Namespace> {
        let _guard = self.write_lock.lock().await;
        let key = namespace_key(&ns.name);
        if self.kv.get(&key).await?.is_some() {
            return Err(GovernanceError::AlreadyExists(format!(
                "namespace {}",
                ns.name
            )));
        }
        self.kv.put_json(&key, &ns).await?;
        Ok(ns)
    }

    async fn list_namespaces(&self) -> GovernanceResult<Vec<Namespace>> {
        Ok(self.kv.list_json(NAMESPACES_PREFIX).await?)
    }

    async fn delete_namespace(&self, name: &str) -> GovernanceResult<()> {
        self.remove(&namespace_key(name), format!("namespace {}", name))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pkg_types::resources::ResourceAmounts;
    use pkg_types::vdc::VdcPhase;
    use pkg_types::zone::ZoneStatus;
    use std::collections::HashMap;

    async fn open_store() -> (tempfile::TempDir, SlateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SlateStore::open(dir.path().to_str().unwrap()).await.unwrap();
        (dir, store)
    }

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

    fn vdc(org: &str, id: &str, zone: Option<&str>) -> VirtualDataCenter {
        VirtualDataCenter {
            id: id.to_string(),
            name: id.to_string(),
            org_id: org.to_string(),
            zone_id: zone.map(str::to_string),
            resources: ResourceAmounts::new(1, 2, 3),
            phase: VdcPhase::Pending,
            namespace: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn org_prefix_does_not_leak_into_similar_org() {
        let (_dir, store) = open_store().await;

        store.create_vdc(vdc("acme", "a", Some("z1"))).await.unwrap();
        store.create_vdc(vdc("acme-2", "b", Some("z1"))).await.unwrap();
        store.create_vdc(vdc("acme", "c", None)).await.unwrap();

        assert_eq!(store.list_vdcs(Some("acme")).await.unwrap().len(), 2);
        assert_eq!(
            store
                .list_vdcs_by_org_and_zone("acme", "z1")
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.list_vdcs_by_zone("z1").await.unwrap().len(), 2);

        let err = store.create_vdc(vdc("acme", "a", None)).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyExists(_)));
        assert!(matches!(
            store.delete_vdc("acme", "missing").await,
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn zone_names_are_unique() {
        let (_dir, store) = open_store().await;
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
        let (_dir, store) = open_store().await;
        store.create_quota(quota("acme", "z1")).await.unwrap();
        store.create_quota(quota("acme", "z2")).await.unwrap();
        let err = store.create_quota(quota("acme", "z1")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyExists(_)));
        assert_eq!(store.list_quotas(Some("acme")).await.unwrap().len(), 2);
        assert_eq!(store.list_quotas(Some("other")).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let (_dir, store) = open_store().await;
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
        assert!(matches!(
            store.update_vdc(vdc("acme", "a", None)).await,
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_entry_fails_listing() {
        let (_dir, store) = open_store().await;
        store.create_vdc(vdc("acme", "a", Some("z1"))).await.unwrap();
        // Valid JSON that no longer matches the VDC shape.
        store
            .kv
            .put(&vdc_key("acme", "big"), br#"{"phase":"Suspended"}"#)
            .await
            .unwrap();

        assert!(matches!(
            store.list_vdcs_by_zone("z1").await,
            Err(GovernanceError::Store(_))
        ));
        assert!(matches!(
            store.list_vdcs_by_org_and_zone("acme", "z1").await,
            Err(GovernanceError::Store(_))
        ));
        assert!(matches!(
            store.list_vdcs(Some("acme")).await,
            Err(GovernanceError::Store(_))
        ));
    }
}
