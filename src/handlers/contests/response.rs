//! Contest response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Contest, ContestParticipation, ParticipationKind};

/// A participation as returned to its owner
#[derive(Debug, Serialize)]
pub struct ParticipationResponse {
    pub id: i64,
    pub contest_key: String,
    pub kind: ParticipationKind,
    pub virtual_id: i32,
    pub start: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub score: f64,
    pub cumtime: i64,
    pub is_disqualified: bool,
}

impl ParticipationResponse {
    pub fn new(participation: &ContestParticipation, contest: &Contest) -> Self {
        Self {
            id: participation.id,
            contest_key: contest.key.clone(),
            kind: participation.kind(),
            virtual_id: participation.virtual_id,
            start: participation.start(contest),
            end_time: participation.end_time(contest),
            score: participation.score,
            cumtime: participation.cumtime,
            is_disqualified: participation.is_disqualified,
        }
    }
}
