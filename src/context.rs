//! Request-scoped contest state
//!
//! Everything derived from a contest and "now" is computed once when the
//! context is built and then passed down explicitly, so every check made
//! during one operation agrees on the same instant.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{AppError, AppResult},
    formats::{ContestFormat, FormatRegistry, ProblemLabelScheme},
    models::{Contest, Viewer},
};

pub struct ContestContext {
    pub contest: Arc<Contest>,
    pub organizers: Vec<i64>,
    pub now: DateTime<Utc>,
    pub ended: bool,
    pub can_join: bool,
    pub show_scoreboard: bool,
    format: Box<dyn ContestFormat>,
    labels: Option<ProblemLabelScheme>,
}

impl ContestContext {
    pub fn new(
        contest: Contest,
        organizers: Vec<i64>,
        registry: &FormatRegistry,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let contest = Arc::new(contest);
        let format = registry.build(contest.clone())?;
        let labels = ProblemLabelScheme::from_config(contest.problem_labels.as_ref())?;

        let ended = contest.end_time < now;
        let can_join = contest.start_time <= now;
        let show_scoreboard = can_join && !contest.hide_scoreboard;

        Ok(Self {
            contest,
            organizers,
            now,
            ended,
            can_join,
            show_scoreboard,
            format,
            labels,
        })
    }

    pub fn format(&self) -> &dyn ContestFormat {
        self.format.as_ref()
    }

    pub fn time_before_start(&self) -> Option<Duration> {
        (self.contest.start_time >= self.now).then(|| self.contest.start_time - self.now)
    }

    pub fn time_before_end(&self) -> Option<Duration> {
        (self.contest.end_time >= self.now).then(|| self.contest.end_time - self.now)
    }

    pub fn contest_window_length(&self) -> Duration {
        self.contest.contest_window_length()
    }

    /// Scoreboard label of the problem at zero-based `index`
    pub fn problem_label(&self, index: usize) -> String {
        match &self.labels {
            Some(scheme) => scheme.label(index).unwrap_or_else(|e| {
                tracing::warn!(contest = %self.contest.key, index, error = %e, "Problem label failed");
                self.format.get_label_for_problem(index)
            }),
            None => self.format.get_label_for_problem(index),
        }
    }

    pub fn is_organizer(&self, viewer: &Viewer) -> bool {
        viewer
            .profile_id
            .is_some_and(|id| self.organizers.contains(&id))
    }

    pub fn is_editable_by(&self, viewer: &Viewer) -> bool {
        if viewer.can_edit_all_contests() {
            return true;
        }
        viewer.can_edit_own_contests() && self.is_organizer(viewer)
    }

    /// Fails with `NotFound` when the viewer may not know the contest exists
    pub fn access_check(&self, viewer: &Viewer) -> AppResult<()> {
        if self.is_editable_by(viewer) || self.contest.is_visible {
            Ok(())
        } else {
            Err(AppError::NotFound("Contest not found".to_string()))
        }
    }

    pub fn is_accessible_by(&self, viewer: &Viewer) -> bool {
        self.access_check(viewer).is_ok()
    }

    pub fn is_joinable_by(&self, viewer: &Viewer) -> bool {
        if !viewer.is_authenticated() || !self.is_accessible_by(viewer) {
            return false;
        }
        if self.ended {
            return self.contest.is_virtualable;
        }
        true
    }

    pub fn is_in_contest(&self, viewer: &Viewer) -> bool {
        viewer
            .current_contest
            .is_some_and(|current| current.contest_id == self.contest.id)
    }

    pub fn can_see_full_scoreboard(&self, viewer: &Viewer) -> bool {
        self.show_scoreboard || self.is_editable_by(viewer)
    }

    pub fn can_see_own_scoreboard(&self, viewer: &Viewer) -> bool {
        if self.can_see_full_scoreboard(viewer) {
            return true;
        }
        if !self.can_join {
            return false;
        }
        self.show_scoreboard || self.is_in_contest(viewer) || self.ended
    }
}
