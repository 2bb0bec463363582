//! Profile model and request viewer

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::roles;

/// User profile as seen by the contest core
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub display_rank: String,
    /// Excluded from rankings
    pub is_unlisted: bool,
    /// Participation the user is currently competing in
    pub current_contest: Option<i64>,
}

/// The participation a profile is currently competing in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentContest {
    pub participation_id: i64,
    pub contest_id: i64,
}

/// The identity a request is evaluated for
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub profile_id: Option<i64>,
    pub role: String,
    pub current_contest: Option<CurrentContest>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(profile_id: i64, role: impl Into<String>) -> Self {
        Self {
            profile_id: Some(profile_id),
            role: role.into(),
            current_contest: None,
        }
    }

    pub fn with_current_contest(mut self, current: Option<CurrentContest>) -> Self {
        self.current_contest = current;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile_id.is_some()
    }

    pub fn is_superuser(&self) -> bool {
        self.role == roles::ADMIN
    }

    /// Permission to edit every contest
    pub fn can_edit_all_contests(&self) -> bool {
        self.role == roles::ADMIN
    }

    /// Permission to edit contests the viewer organizes
    pub fn can_edit_own_contests(&self) -> bool {
        matches!(self.role.as_str(), roles::ADMIN | roles::ORGANIZER)
    }

    pub fn can_lock_contests(&self) -> bool {
        self.role == roles::ADMIN
    }
}
