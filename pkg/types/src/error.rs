//! Error taxonomy shared by the governance, admission and API layers.

use serde::{Deserialize, Serialize};

use crate::resources::Resource;

/// Why a VDC placement was refused. Each variant has a stable code so callers
/// can tell an unhealthy zone from an exhausted quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum PlacementDenial {
    #[error("zone unavailable: zone {zone_id} not found")]
    ZoneNotFound { zone_id: String },

    #[error("zone unavailable: zone {zone_id} is {status}")]
    ZoneUnhealthy { zone_id: String, status: String },

    #[error("organization not permitted in zone: {org_id} has no access to {zone_id}")]
    OrganizationNotPermitted { org_id: String, zone_id: String },

    #[error(
        "organization quota exceeded: {resource} request {requested} + used {used} > quota {quota}"
    )]
    OrganizationQuotaExceeded {
        resource: Resource,
        requested: i64,
        used: i64,
        quota: i64,
    },

    #[error("zone capacity exceeded: {resource} request {requested} + used {used} > quota {quota}")]
    ZoneCapacityExceeded {
        resource: Resource,
        requested: i64,
        used: i64,
        quota: i64,
    },
}

impl PlacementDenial {
    pub fn code(&self) -> &'static str {
        match self {
            PlacementDenial::ZoneNotFound { .. } => "zone_not_found",
            PlacementDenial::ZoneUnhealthy { .. } => "zone_unhealthy",
            PlacementDenial::OrganizationNotPermitted { .. } => "organization_not_permitted",
            PlacementDenial::OrganizationQuotaExceeded { .. } => "organization_quota_exceeded",
            PlacementDenial::ZoneCapacityExceeded { .. } => "zone_capacity_exceeded",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The target is still referenced and cannot be removed.
    #[error("in use: {0}")]
    InUse(String),

    #[error("policy denied: {0}")]
    PolicyDenied(#[from] PlacementDenial),

    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;

impl GovernanceError {
    /// HTTP status the API surfaces for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GovernanceError::NotFound(_) => 404,
            GovernanceError::AlreadyExists(_) | GovernanceError::InUse(_) => 409,
            GovernanceError::InvalidInput(_) | GovernanceError::Decode(_) => 400,
            GovernanceError::PolicyDenied(_) => 403,
            GovernanceError::Store(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GovernanceError::NotFound(_) => "not_found",
            GovernanceError::AlreadyExists(_) => "already_exists",
            GovernanceError::InvalidInput(_) => "invalid_input",
            GovernanceError::InUse(_) => "conflict",
            GovernanceError::PolicyDenied(denial) => denial.code(),
            GovernanceError::Decode(_) => "decode_error",
            GovernanceError::Store(_) => "internal",
        }
    }
}
