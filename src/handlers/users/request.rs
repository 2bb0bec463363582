//! User request DTOs

use serde::Deserialize;

/// Problem aggregate query parameters
#[derive(Debug, Deserialize)]
pub struct UserProblemsQuery {
    /// Restrict the aggregates to one participation of the user
    pub participation_id: Option<i64>,
}
