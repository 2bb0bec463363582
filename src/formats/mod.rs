//! Contest formats
//!
//! A contest format turns the contest submissions of one participation into
//! its score, cumulative time, tiebreaker and format specific data, and knows
//! how to present that data on a scoreboard. Formats are selected by name
//! through the [`FormatRegistry`].

mod bonuses;
mod default;
mod ics3u;
pub mod labels;
pub mod registry;

pub use bonuses::{BonusesConfig, BonusesContestFormat};
pub use default::DefaultContestFormat;
pub use ics3u::Ics3uContestFormat;
pub use labels::ProblemLabelScheme;
pub use registry::{FormatFactory, FormatRegistry, FormatValidator};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    models::{ContestParticipation, ContestProblem, ContestSubmission, ParticipationResults},
    utils::{format_points, format_solving_time},
};

/// Errors raised by contest formats
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown contest format \"{0}\"")]
    UnknownFormat(String),

    #[error("{0}")]
    InvalidConfig(String),

    #[error("invalid problem label scheme: {0}")]
    InvalidLabels(String),

    #[error("format data for contest problem {problem_id} is unreadable: {reason}")]
    StaleData { problem_id: i64, reason: String },
}

/// Capability set every contest format implements
pub trait ContestFormat: Send + Sync {
    /// Registry name of the format
    fn name(&self) -> &'static str;

    /// Compute the scoring fields of a participation from its contest submissions.
    ///
    /// Must be deterministic: the same submissions always produce the same results.
    fn update_participation(
        &self,
        participation: &ContestParticipation,
        submissions: &[ContestSubmission],
    ) -> ParticipationResults;

    /// Scoreboard cell for one problem of one participation
    fn display_user_problem(
        &self,
        participation: &ContestParticipation,
        username: &str,
        problem: &ContestProblem,
    ) -> Result<ProblemCell, FormatError>;

    /// Scoreboard cell with the participation's total
    fn display_participation_result(&self, participation: &ContestParticipation) -> ResultCell;

    fn get_label_for_problem(&self, index: usize) -> String {
        (index + 1).to_string()
    }

    /// Bonus points a freshly judged submission earns under this format
    fn submission_bonus(
        &self,
        _participation: &ContestParticipation,
        _problem: &ContestProblem,
        _points: f64,
        _submitted_at: DateTime<Utc>,
        _is_first_submission: bool,
    ) -> i32 {
        0
    }
}

/// How good the best submission on a problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionState {
    Failed,
    Partial,
    Full,
}

impl SolutionState {
    pub fn from_points(points: f64, total: f64) -> Self {
        if points == 0.0 {
            Self::Failed
        } else if points == total {
            Self::Full
        } else {
            Self::Partial
        }
    }
}

/// One problem cell of a scoreboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProblemCell {
    /// No submissions on this problem
    Empty,
    /// The stored format data could not be read
    Unknown,
    Scored(ScoredCell),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCell {
    pub state: SolutionState,
    pub points: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<String>,
    pub first_solve: bool,
    pub disqualified: bool,
    pub pretest: bool,
}

impl ScoredCell {
    fn new(state: SolutionState, points: f64, link: String) -> Self {
        Self {
            state,
            points: format_points(points, 1),
            link,
            time: None,
            bonus: None,
            first_solve: false,
            disqualified: false,
            pretest: false,
        }
    }
}

/// Total column of a scoreboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCell {
    pub points: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumtime: Option<String>,
}

impl ResultCell {
    fn points_only(score: f64, precision: i32) -> Self {
        Self {
            points: format_points(score, precision),
            cumtime: None,
        }
    }

    fn with_time(score: f64, precision: i32, cumtime: i64) -> Self {
        Self {
            points: format_points(score, precision),
            cumtime: Some(format_solving_time(cumtime as f64)),
        }
    }
}

/// Link to the submissions of `username` on a problem of contest `key`
pub fn submissions_link(key: &str, username: &str, problem: &ContestProblem) -> String {
    format!(
        "/contest/{}/submissions/{}/{}",
        key, username, problem.problem_code
    )
}

/// Group contest submissions by contest problem id
fn by_problem(submissions: &[ContestSubmission]) -> BTreeMap<i64, Vec<&ContestSubmission>> {
    let mut grouped: BTreeMap<i64, Vec<&ContestSubmission>> = BTreeMap::new();
    for submission in submissions {
        grouped.entry(submission.problem_id).or_default().push(submission);
    }
    grouped
}

/// Read the typed format data stored for one contest problem.
///
/// `Ok(None)` means the participant never submitted to the problem.
fn problem_data<T: DeserializeOwned>(
    participation: &ContestParticipation,
    problem_id: i64,
) -> Result<Option<T>, FormatError> {
    let data = match &participation.format_data {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(data) => data,
    };

    let object = data.as_object().ok_or_else(|| FormatError::StaleData {
        problem_id,
        reason: "format data is not an object".to_string(),
    })?;

    match object.get(&problem_id.to_string()) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(cell) => serde_json::from_value(cell.clone())
            .map(Some)
            .map_err(|e| FormatError::StaleData {
                problem_id,
                reason: e.to_string(),
            }),
    }
}

/// Serialize per-problem data keyed by contest problem id
fn encode_format_data<T: Serialize>(data: BTreeMap<i64, T>) -> serde_json::Value {
    let object: serde_json::Map<String, serde_json::Value> = data
        .into_iter()
        .map(|(id, cell)| {
            (
                id.to_string(),
                serde_json::to_value(cell).unwrap_or(serde_json::Value::Null),
            )
        })
        .collect();
    serde_json::Value::Object(object)
}

/// Reject anything but a missing config or an empty object
fn validate_empty_config(format: &str, config: Option<&serde_json::Value>) -> Result<(), FormatError> {
    match config {
        None | Some(serde_json::Value::Null) => Ok(()),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(()),
        Some(_) => Err(FormatError::InvalidConfig(format!(
            "{} contest expects no config or empty dict as config",
            format
        ))),
    }
}
