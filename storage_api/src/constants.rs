use const_format::formatcp;

// Devicegraph constants

/// Name of the devicegraph holding the probed (or empty) system state.
pub const PROBED_DEVICEGRAPH: &str = "probed";

/// Name of the devicegraph clients stage their changes in.
pub const STAGING_DEVICEGRAPH: &str = "staging";

/// First storage id handed out. Starting above zero makes uninitialized ids
/// easy to spot in logs.
pub const FIRST_SID: u64 = 42;

/// Size of a KiB in bytes.
pub const KIB: u64 = 1024;

// Configuration constants

/// Directory holding the storage-ng configuration files.
pub const STORAGE_CONFIG_DIR: &str = "/etc/storage-ng";

/// Default path to load the environment configuration from.
pub const ENVIRONMENT_CONFIG_PATH: &str = formatcp!("{STORAGE_CONFIG_DIR}/environment.yaml");
