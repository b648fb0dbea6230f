use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resources::ResourceAmounts;
use crate::zone::{UtilizationPercent, ZoneStatus};

/// Summed commitment of a set of VDCs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    pub used: ResourceAmounts,
    pub vdc_count: u32,
    pub active_vdc_count: u32,
}

/// Point-in-time utilization of one zone. Computed per query, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneUtilization {
    pub zone_id: String,
    pub zone_name: String,
    pub status: ZoneStatus,
    pub capacity: ResourceAmounts,
    pub quota: ResourceAmounts,
    pub used: ResourceAmounts,
    pub utilization: UtilizationPercent,
    pub vdc_count: u32,
    pub active_vdc_count: u32,
    pub last_sync: DateTime<Utc>,
}
