use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resources::ResourceAmounts;
use crate::zone::{Zone, ZoneStatus};

/// Ledger row: how much of a zone one organization may consume.
/// Keyed by `(org_id, zone_id)`; the store keeps the pair unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgZoneQuota {
    pub org_id: String,
    pub zone_id: String,
    #[serde(default)]
    pub quota: ResourceAmounts,
    /// Independent gate: a nonzero quota can still be denied.
    #[serde(default = "default_allowed")]
    pub is_allowed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Read-time join of the referenced zone. Never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
}

fn default_allowed() -> bool {
    true
}

/// Body of a ledger create/update request. The `(org, zone)` key comes from
/// the request path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgZoneQuotaSpec {
    #[serde(default)]
    pub quota: ResourceAmounts,
    #[serde(default = "default_allowed")]
    pub is_allowed: bool,
}

/// Derived view: an organization's grant in one zone plus its live usage there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationZoneAccess {
    pub org_id: String,
    pub zone_id: String,
    pub zone_name: String,
    pub zone_status: ZoneStatus,
    pub quota: ResourceAmounts,
    pub is_allowed: bool,
    pub used: ResourceAmounts,
    /// `quota - used`, clamped at zero.
    pub available: ResourceAmounts,
    pub vdc_count: u32,
    pub active_vdc_count: u32,
}
