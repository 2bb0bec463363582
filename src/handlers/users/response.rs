//! User response DTOs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::AttemptedProblem;

/// Completed and attempted problems of a user or participation
#[derive(Debug, Serialize)]
pub struct UserProblemsResponse {
    pub profile_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation_id: Option<i64>,
    /// Problem ids solved at full points
    pub completed: Vec<i64>,
    /// Best score on problems not fully solved, keyed by problem id
    pub attempted: BTreeMap<i64, AttemptedProblem>,
}
