pub mod admission;
pub mod namespaces;
pub mod quotas;
pub mod vdcs;
pub mod zones;
