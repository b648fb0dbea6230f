use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resources::ResourceAmounts;

// --- Zone status ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    #[default]
    Available,
    Maintenance,
    Unavailable,
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneStatus::Available => write!(f, "available"),
            ZoneStatus::Maintenance => write!(f, "maintenance"),
            ZoneStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

// --- Utilization percentages ---

/// Per-resource utilization in percent of the zone quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct UtilizationPercent {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
}

/// `used / quota * 100`; a zero (or negative) quota reports 0%.
fn percent(used: i64, quota: i64) -> f64 {
    if quota <= 0 {
        return 0.0;
    }
    used as f64 / quota as f64 * 100.0
}

// --- Persisted Zone object ---

/// One capacity domain: a cluster or a cluster partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    /// Human name, globally unique across zones.
    pub name: String,
    /// Cluster backing this zone.
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: ZoneStatus,
    /// Raw cluster size.
    #[serde(default)]
    pub capacity: ResourceAmounts,
    /// Administratively allocatable share of `capacity`. Not validated against
    /// it; the delta is platform headroom.
    #[serde(default)]
    pub quota: ResourceAmounts,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub last_sync: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    /// `capacity - quota` per resource. Negative when the zone is misconfigured.
    pub fn available_capacity(&self) -> ResourceAmounts {
        self.capacity.saturating_sub(&self.quota)
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ZoneStatus::Available
    }

    pub fn utilization_percentage(&self, used: &ResourceAmounts) -> UtilizationPercent {
        UtilizationPercent {
            cpu: percent(used.cpu, self.quota.cpu),
            memory: percent(used.memory, self.quota.memory),
            storage: percent(used.storage, self.quota.storage),
        }
    }

    /// True iff the zone is healthy and `used + request <= quota` for every
    /// resource. Never mutates anything.
    pub fn can_accommodate(&self, request: &ResourceAmounts, used: &ResourceAmounts) -> bool {
        self.is_healthy() && ResourceAmounts::first_exceeding(request, used, &self.quota).is_none()
    }
}

/// Administrative fields of a zone, as supplied on registration or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: ZoneStatus,
    #[serde(default)]
    pub capacity: ResourceAmounts,
    #[serde(default)]
    pub quota: ResourceAmounts,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Body of a zone sync heartbeat: status and raw capacity reported by the
/// cluster. Quota is administrative and never changed by a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSync {
    pub status: ZoneStatus,
    #[serde(default)]
    pub capacity: Option<ResourceAmounts>,
}
