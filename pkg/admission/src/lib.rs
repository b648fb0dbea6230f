//! Namespace topology admission.
//!
//! Gates namespace and workload mutations at the API boundary: org/VDC
//! namespaces must come from the management plane with a valid topology,
//! and restricted workloads may only land in VDC namespaces. Quota is not
//! consulted here; placement enforces it when a VDC is created.

pub mod policy;
pub mod review;

pub use policy::{AdmissionDecision, NamespacePolicy};
pub use review::{ReviewOutcome, handle_review};
