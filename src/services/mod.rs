//! Business logic services

pub mod auth_service;
pub mod contest_service;
pub mod participation_service;
pub mod ranking_service;

pub use auth_service::{AuthService, Claims};
pub use contest_service::{ContestService, LockOutcome};
pub use participation_service::{JudgedOutcome, ParticipationService};
pub use ranking_service::{RankingService, RankingView};
