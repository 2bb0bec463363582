//! Contest model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    constants::MAX_POINTS_PRECISION,
    error::{AppError, AppResult},
    formats::{FormatRegistry, ProblemLabelScheme},
    utils::validation::validate_contest_key,
};

/// Contest database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contest {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub description: String,
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Per-participant duration cap in seconds
    pub time_limit_secs: Option<i64>,
    pub is_visible: bool,
    pub is_virtualable: bool,
    pub hide_scoreboard: bool,
    /// Freezes propagation of rescored submissions
    pub is_locked: bool,
    pub points_precision: i32,
    /// Number of live participants
    pub user_count: i32,
    pub format_name: String,
    pub format_config: Option<serde_json::Value>,
    pub problem_labels: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contest {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::seconds)
    }

    pub fn contest_window_length(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Validate the editable fields of a contest before it is saved.
    ///
    /// Checks the time window, precision bounds, key shape, the format
    /// configuration and the problem label scheme.
    pub fn clean(&self, registry: &FormatRegistry) -> AppResult<()> {
        validate_contest_key(&self.key).map_err(|e| AppError::Validation(e.to_string()))?;

        if self.start_time >= self.end_time {
            return Err(AppError::Validation(
                "Contest must end after it starts".to_string(),
            ));
        }

        if !(0..=MAX_POINTS_PRECISION).contains(&self.points_precision) {
            return Err(AppError::Validation(format!(
                "Points precision must be between 0 and {}",
                MAX_POINTS_PRECISION
            )));
        }

        if let Some(limit) = self.time_limit_secs {
            if limit <= 0 {
                return Err(AppError::Validation(
                    "Time limit must be positive".to_string(),
                ));
            }
        }

        registry.validate(&self.format_name, self.format_config.as_ref())?;

        // A contest has at least one problem at index 0, so the scheme must label it.
        if let Some(scheme) = ProblemLabelScheme::from_config(self.problem_labels.as_ref())? {
            scheme.label(0)?;
        }

        Ok(())
    }
}

/// Problem bound to a contest
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContestProblem {
    pub id: i64,
    pub contest_id: i64,
    pub problem_id: i64,
    pub problem_code: String,
    pub problem_name: String,
    /// Points awarded in this contest for a full solution
    pub points: i32,
    pub partial: bool,
    pub is_pretested: bool,
    pub order: i32,
    pub max_submissions: Option<i32>,
}
