/// Days of events loaded from each calendar when `days_to_sync` is not configured.
pub const DEFAULT_DAYS_TO_SYNC: u32 = 7;

/// Longest window `days_to_sync` may configure (ten years).
pub const MAX_DAYS_TO_SYNC: u32 = 3650;

/// Hex characters kept from the event digest.
pub const DEFAULT_HASH_LENGTH: usize = 8;

/// Longest fingerprint the scheme accepts (a full SHA-256 hex digest).
pub const MAX_HASH_LENGTH: usize = 64;

/// Per-call timeout for provider subprocesses when none is configured.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
