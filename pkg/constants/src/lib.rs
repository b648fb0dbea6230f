//! Centralized constants for the ovim governance engine.
//!
//! Label keys, name prefixes and registry keys are matched literally by
//! controllers and namespace consumers, so they live in one place.

pub mod labels;
pub mod network;
pub mod paths;
pub mod resources;
pub mod state;
