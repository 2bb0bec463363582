//! Admin request DTOs

use serde::Deserialize;
use validator::Validate;

/// Change the format of a contest
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFormatRequest {
    #[validate(length(min = 1, max = 32))]
    pub format_name: String,

    /// Format specific configuration; `null` or absent for none
    pub format_config: Option<serde_json::Value>,
}

/// Lock or unlock a contest
#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

/// Recompute a batch of participations in the background
#[derive(Debug, Deserialize, Validate)]
pub struct RecomputeRequest {
    #[validate(length(min = 1, max = 1000))]
    pub participation_ids: Vec<i64>,
}

/// Set the disqualification flag of a participation
#[derive(Debug, Deserialize)]
pub struct SetDisqualifiedRequest {
    pub disqualified: bool,
}
