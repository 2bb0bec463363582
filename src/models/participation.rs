//! Contest participation model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::participation::{LIVE, SPECTATE};

use super::Contest;

/// One competitor's attempt at a contest
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ContestParticipation {
    pub id: i64,
    pub contest_id: i64,
    pub user_id: i64,
    pub real_start: DateTime<Utc>,
    pub score: f64,
    /// Cumulative time in seconds
    pub cumtime: i64,
    pub tiebreaker: f64,
    pub is_disqualified: bool,
    /// 0 for live, -1 for spectate, n > 0 for the n-th virtual attempt
    pub virtual_id: i32,
    /// Format specific scoring state
    pub format_data: Option<serde_json::Value>,
}

/// Discriminates what a participation row represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum ParticipationKind {
    Live,
    Spectate,
    Virtual(i32),
}

impl ParticipationKind {
    pub fn from_virtual_id(virtual_id: i32) -> Self {
        match virtual_id {
            LIVE => Self::Live,
            SPECTATE => Self::Spectate,
            n => Self::Virtual(n),
        }
    }

    pub fn virtual_id(self) -> i32 {
        match self {
            Self::Live => LIVE,
            Self::Spectate => SPECTATE,
            Self::Virtual(n) => n,
        }
    }
}

impl std::fmt::Display for ParticipationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Spectate => write!(f, "spectate"),
            Self::Virtual(n) => write!(f, "v{}", n),
        }
    }
}

/// Scoring fields produced by a contest format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationResults {
    pub score: f64,
    pub cumtime: i64,
    pub tiebreaker: f64,
    pub format_data: serde_json::Value,
}

impl ContestParticipation {
    pub fn kind(&self) -> ParticipationKind {
        ParticipationKind::from_virtual_id(self.virtual_id)
    }

    pub fn is_live(&self) -> bool {
        self.virtual_id == LIVE
    }

    pub fn is_spectate(&self) -> bool {
        self.virtual_id == SPECTATE
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_id > 0
    }

    /// The instant this participant's clock started
    pub fn start(&self, contest: &Contest) -> DateTime<Utc> {
        if contest.time_limit_secs.is_none() && (self.is_live() || self.is_spectate()) {
            contest.start_time
        } else {
            self.real_start
        }
    }

    /// The instant this participation stops accepting submissions
    pub fn end_time(&self, contest: &Contest) -> DateTime<Utc> {
        if self.is_spectate() {
            return contest.end_time;
        }

        if self.is_virtual() {
            return match contest.time_limit() {
                Some(limit) => self.real_start + limit,
                None => self.real_start + contest.contest_window_length(),
            };
        }

        match contest.time_limit() {
            Some(limit) => std::cmp::min(self.real_start + limit, contest.end_time),
            None => contest.end_time,
        }
    }

    pub fn ended(&self, contest: &Contest, now: DateTime<Utc>) -> bool {
        self.end_time(contest) < now
    }

    pub fn time_remaining(&self, contest: &Contest, now: DateTime<Utc>) -> Option<Duration> {
        let end = self.end_time(contest);
        if end >= now { Some(end - now) } else { None }
    }

    /// Copy format results onto this row
    pub fn apply_results(&mut self, results: &ParticipationResults) {
        self.score = results.score;
        self.cumtime = results.cumtime;
        self.tiebreaker = results.tiebreaker;
        self.format_data = Some(results.format_data.clone());
    }
}

/// Values required to insert a participation
#[derive(Debug, Clone)]
pub struct NewParticipation {
    pub contest_id: i64,
    pub user_id: i64,
    pub virtual_id: i32,
    pub real_start: DateTime<Utc>,
}

/// Participation joined with what a scoreboard row needs
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RankingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub participation: ContestParticipation,
    pub username: String,
    pub display_rank: String,
    /// Number of contest submissions, the last sort key
    pub submission_count: i64,
}
