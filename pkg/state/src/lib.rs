//! Storage collaborators for the governance engine.
//!
//! The engine only sees the traits in [`store`]; [`memory::MemoryStore`] and
//! [`slate::SlateStore`] are interchangeable backends selected at startup.

pub mod client;
pub mod memory;
pub mod slate;
pub mod store;

pub use memory::MemoryStore;
pub use slate::SlateStore;
pub use store::{GovernanceStore, NamespaceLookup, NamespaceStore, QuotaStore, VdcStore, ZoneStore};
