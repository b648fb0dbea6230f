pub mod admission;
pub mod config;
pub mod error;
pub mod namespace;
pub mod quota;
pub mod resources;
pub mod utilization;
pub mod validate;
pub mod vdc;
pub mod zone;
