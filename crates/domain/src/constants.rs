//! Domain constants
//!
//! Defaults for every tunable in `RestoreKitConfig` plus the few literal
//! values the restore protocol depends on.

// Restore protocol
pub const SIZE_JOB_DONE_STATUS: &str = "done";
pub const MAX_PERCENT_COMPLETE: u8 = 100;

// Restore polling
pub const DEFAULT_JOB_POLLING_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_FILE_SIZE_POLL_INTERVAL_MS: u64 = 1_000;

// Request dispatcher
pub const DEFAULT_CONCURRENT_WORKERS: usize = 4;
pub const DEFAULT_MAX_REQUESTS_PER_SECOND: f64 = 20.0;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

// HTTP transport
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 200;
pub const DEFAULT_USER_AGENT: &str = concat!("restorekit/", env!("CARGO_PKG_VERSION"));

// Logging
pub const DEFAULT_LOG_FILTER: &str = "info";
