//! Resource governance: utilization aggregation, the organization-zone quota
//! ledger, and two-tier placement admission for VDCs.
//!
//! [`placement::Placement::accommodate`] is a check only. A caller that
//! commits on its result must hold the zone's [`locks::ZoneLocks`] guard
//! across the check and the write; [`provision::Provisioner`] does this.

pub mod aggregate;
pub mod ledger;
pub mod locks;
pub mod placement;
pub mod provision;
pub mod zones;

#[cfg(test)]
pub(crate) mod testutil;
