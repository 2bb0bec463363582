//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// CACHE DEFAULTS
// =============================================================================

/// Default lifetime of cached problem aggregates (24 hours)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Cache key prefixes for the problem aggregate caches
pub mod cache_keys {
    pub const USER_COMPLETE: &str = "user_complete";
    pub const USER_ATTEMPTED: &str = "user_attempted";
    pub const CONTEST_COMPLETE: &str = "contest_complete";
    pub const CONTEST_ATTEMPTED: &str = "contest_attempted";
}

// =============================================================================
// JOIN DEFAULTS
// =============================================================================

/// Maximum attempts to allocate a virtual participation id
pub const DEFAULT_JOIN_MAX_RETRIES: u32 = 8;

/// Base delay for the join retry backoff in milliseconds
pub const DEFAULT_JOIN_RETRY_BASE_DELAY_MS: u64 = 5;

// =============================================================================
// BACKGROUND JOBS
// =============================================================================

/// How long a finished job's status stays pollable (1 hour)
pub const JOB_RETENTION_SECS: u64 = 3_600;

// =============================================================================
// CONTEST SETTINGS
// =============================================================================

/// Score written to disqualified participations so they always sort last
pub const DISQUALIFIED_SCORE: f64 = -9999.0;

/// Largest allowed points precision
pub const MAX_POINTS_PRECISION: i32 = 10;

/// Digits used when converting judged points into contest points
pub const CONTEST_POINTS_PRECISION: i32 = 3;

/// Contest format identifiers
pub mod formats {
    pub const DEFAULT: &str = "default";
    pub const ICS3U: &str = "ics3u";
    pub const BONUSES: &str = "bonuses";
}

/// Participation `virtual_id` values with special meaning
pub mod participation {
    /// The canonical live participation
    pub const LIVE: i32 = 0;
    /// An organizer's preview participation
    pub const SPECTATE: i32 = -1;
}

// =============================================================================
// USER ROLES
// =============================================================================

/// User role identifiers
pub mod roles {
    /// May edit and lock every contest
    pub const ADMIN: &str = "admin";
    /// May edit contests they organize
    pub const ORGANIZER: &str = "organizer";
    pub const USER: &str = "user";

    /// All user roles
    pub const ALL: &[&str] = &[ADMIN, ORGANIZER, USER];
}

// =============================================================================
// SUBMISSION RESULTS
// =============================================================================

/// Submission result codes as reported by the judge
pub mod results {
    pub const ACCEPTED: &str = "AC";
}

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";
