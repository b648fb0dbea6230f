//! Filesystem path constants.

/// Default config file path for the server.
pub const DEFAULT_SERVER_CONFIG: &str = "/etc/ovim/config.yaml";

/// Default data directory for the SlateDB backend.
pub const DEFAULT_SERVER_DATA_DIR: &str = "/tmp/ovim-data";
