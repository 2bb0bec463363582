//! Submission models
//!
//! Raw submissions are produced by the judge; contest submissions carry the
//! contest specific score a submission contributes to a participation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    constants::{CONTEST_POINTS_PRECISION, results},
    utils::round_to,
};

/// Judged submission as reported by the grading engine
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub user_id: i64,
    pub problem_id: i64,
    /// Points awarded by the judge, out of `total`
    pub points: Option<f64>,
    /// Maximum points of the judged test data
    pub total: Option<f64>,
    pub result: Option<String>,
    pub date: DateTime<Utc>,
    pub is_pretested: bool,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        self.result.as_deref() == Some(results::ACCEPTED)
    }

    /// Judged points rescaled onto a problem worth `max_points`.
    ///
    /// `None` while the submission is unjudged; a judged submission without
    /// test data total is worth nothing.
    pub fn scaled_points(&self, max_points: f64) -> Option<f64> {
        let points = self.points?;
        Some(match self.total {
            Some(total) if total > 0.0 => {
                round_to(points / total * max_points, CONTEST_POINTS_PRECISION)
            }
            _ => 0.0,
        })
    }

    /// Accepted with every test data point
    pub fn is_fully_solved(&self) -> bool {
        self.is_accepted()
            && matches!((self.points, self.total), (Some(points), Some(total)) if total > 0.0 && points >= total)
    }
}

/// Contest submission joined with the fields scoring needs
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ContestSubmission {
    pub id: i64,
    pub submission_id: i64,
    /// Contest problem id
    pub problem_id: i64,
    pub participation_id: i64,
    pub points: f64,
    pub is_pretest: bool,
    pub bonus: i32,
    pub updated_frozen: bool,
    pub is_disqualified: bool,
    /// Submission time
    pub date: DateTime<Utc>,
    /// Full points of the contest problem
    pub problem_points: i32,
}

impl ContestSubmission {
    pub fn total(&self) -> f64 {
        self.points + self.bonus as f64
    }
}

/// New scoring values for a contest submission
#[derive(Debug, Clone, PartialEq)]
pub struct ContestSubmissionScore {
    pub points: f64,
    pub bonus: i32,
    pub is_pretest: bool,
}

/// A problem attempted but not fully solved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptedProblem {
    pub achieved_points: f64,
    pub max_points: f64,
}
