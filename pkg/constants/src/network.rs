//! Network-related constants.

/// Default port for the governance API server.
pub const DEFAULT_API_PORT: u16 = 8443;

/// Path of the validating admission webhook endpoint.
pub const ADMISSION_VALIDATE_PATH: &str = "/admission/validate";
