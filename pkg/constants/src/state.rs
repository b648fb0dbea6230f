//! State store key layout.

/// Zones: `/registry/zones/<zone-id>`.
pub const ZONES_PREFIX: &str = "/registry/zones/";

/// Ledger rows: `/registry/orgzonequotas/<org-id>/<zone-id>`.
pub const ORG_ZONE_QUOTAS_PREFIX: &str = "/registry/orgzonequotas/";

/// VDCs: `/registry/vdcs/<org-id>/<vdc-id>`.
pub const VDCS_PREFIX: &str = "/registry/vdcs/";

/// Namespaces: `/registry/namespaces/<name>`.
pub const NAMESPACES_PREFIX: &str = "/registry/namespaces/";
