use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resources::ResourceAmounts;

// --- VDC phase ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VdcPhase {
    #[default]
    Pending,
    Active,
    Terminating,
    Failed,
}

impl std::fmt::Display for VdcPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VdcPhase::Pending => write!(f, "Pending"),
            VdcPhase::Active => write!(f, "Active"),
            VdcPhase::Terminating => write!(f, "Terminating"),
            VdcPhase::Failed => write!(f, "Failed"),
        }
    }
}

// --- Persisted VDC object ---

/// A Virtual Data Center: an organization's resource commitment, optionally
/// placed into a zone. Every assigned VDC reserves its resources whatever its
/// phase; only `Active` ones count as active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualDataCenter {
    pub id: String,
    pub name: String,
    pub org_id: String,
    /// Unassigned (legacy) VDCs count toward no zone.
    #[serde(default)]
    pub zone_id: Option<String>,
    /// Committed CPU / memory / storage ceiling.
    #[serde(default)]
    pub resources: ResourceAmounts,
    #[serde(default)]
    pub phase: VdcPhase,
    /// Backing namespace, `vdc-<org>-<vdc>`.
    #[serde(default)]
    pub namespace: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VirtualDataCenter {
    pub fn is_in_zone(&self, zone_id: &str) -> bool {
        self.zone_id.as_deref() == Some(zone_id)
    }

    pub fn is_active(&self) -> bool {
        self.phase == VdcPhase::Active
    }
}

/// Body of a VDC create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVdcRequest {
    pub name: String,
    pub zone_id: String,
    pub resources: ResourceAmounts,
}

/// Body of a VDC resize request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeVdcRequest {
    pub resources: ResourceAmounts,
}

/// Body of a VDC phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVdcPhaseRequest {
    pub phase: VdcPhase,
}
