//! Admin response DTOs

use serde::Serialize;
use uuid::Uuid;

use crate::{services::JudgedOutcome, tasks::RescoreFailure};

/// A queued background job
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
}

/// Contest after a format change, with the rescore job it queued
#[derive(Debug, Serialize)]
pub struct FormatUpdateResponse {
    pub contest_key: String,
    pub format_name: String,
    pub format_config: Option<serde_json::Value>,
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LockResponse {
    pub contest_key: String,
    pub is_locked: bool,
    /// Participations updated from scores held back while locked
    pub propagated: usize,
    pub failures: Vec<RescoreFailure>,
}

#[derive(Debug, Serialize)]
pub struct DisqualifyResponse {
    pub participation_id: i64,
    pub is_disqualified: bool,
    pub score: f64,
}

/// What happened to a judged submission
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JudgedResponse {
    NotInContest,
    Frozen { participation_id: i64 },
    Scored { participation_id: i64, score: f64 },
}

impl From<JudgedOutcome> for JudgedResponse {
    fn from(outcome: JudgedOutcome) -> Self {
        match outcome {
            JudgedOutcome::NotInContest => Self::NotInContest,
            JudgedOutcome::Frozen { participation_id } => Self::Frozen { participation_id },
            JudgedOutcome::Scored { participation } => Self::Scored {
                participation_id: participation.id,
                score: participation.score,
            },
        }
    }
}
