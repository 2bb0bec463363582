//! Persistence seam used by the services
//!
//! Services only talk to a [`ContestStore`]. [`PgStore`] is the PostgreSQL
//! implementation; every method that touches more than one row runs in a
//! single transaction.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{
        AttemptedProblem, Contest, ContestParticipation, ContestProblem, ContestSubmission,
        ContestSubmissionScore, NewParticipation, ParticipationResults, Profile, RankingRow,
        Submission,
    },
};

use super::repositories::{
    ContestRepository, ParticipationRepository, ProfileRepository, SubmissionRepository,
};

/// Which participations a ranking is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationFilter {
    /// Live participations of listed users
    Live,
    /// The live participation of one profile
    UserLive(i64),
    /// Live and virtual participations of one profile, newest first
    UserHistory(i64),
}

#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn contest_by_key(&self, key: &str) -> AppResult<Option<Contest>>;

    async fn contest_by_id(&self, id: i64) -> AppResult<Option<Contest>>;

    async fn contest_organizers(&self, contest_id: i64) -> AppResult<Vec<i64>>;

    /// Problems of a contest in display order
    async fn contest_problems(&self, contest_id: i64) -> AppResult<Vec<ContestProblem>>;

    async fn contest_problem(&self, id: i64) -> AppResult<Option<ContestProblem>>;

    async fn update_contest_format(
        &self,
        contest_id: i64,
        format_name: &str,
        format_config: Option<&serde_json::Value>,
    ) -> AppResult<Contest>;

    async fn set_contest_locked(&self, contest_id: i64, locked: bool) -> AppResult<Contest>;

    /// Recount live participants and store the count on the contest
    async fn update_user_count(&self, contest_id: i64) -> AppResult<i32>;

    async fn participation(&self, id: i64) -> AppResult<Option<ContestParticipation>>;

    async fn find_participation(
        &self,
        contest_id: i64,
        user_id: i64,
        virtual_id: i32,
    ) -> AppResult<Option<ContestParticipation>>;

    /// Highest virtual id a user has in a contest, 0 if none
    async fn max_virtual_id(&self, contest_id: i64, user_id: i64) -> AppResult<i32>;

    /// Insert a participation. Fails with `DataIntegrity` when the
    /// (contest, user, virtual id) triple already exists.
    async fn create_participation(&self, new: &NewParticipation) -> AppResult<ContestParticipation>;

    async fn participation_ids(&self, contest_id: i64) -> AppResult<Vec<i64>>;

    async fn ranking_rows(
        &self,
        contest_id: i64,
        filter: ParticipationFilter,
    ) -> AppResult<Vec<RankingRow>>;

    async fn contest_submissions(&self, participation_id: i64) -> AppResult<Vec<ContestSubmission>>;

    /// Write computed results. A disqualified participation gets the
    /// sentinel score in the same transaction.
    async fn save_results(
        &self,
        participation_id: i64,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation>;

    /// Set the disqualification flag together with fresh results, clear the
    /// owner's current contest if it points here and update the ban list.
    async fn apply_disqualification(
        &self,
        participation_id: i64,
        disqualified: bool,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation>;

    async fn submission(&self, id: i64) -> AppResult<Option<Submission>>;

    async fn contest_submission_by_submission(
        &self,
        submission_id: i64,
    ) -> AppResult<Option<ContestSubmission>>;

    /// Store new scoring values and clear the frozen flag
    async fn update_contest_submission(&self, id: i64, score: &ContestSubmissionScore) -> AppResult<()>;

    async fn mark_frozen(&self, id: i64) -> AppResult<()>;

    /// Contest submissions judged while the contest was locked
    async fn frozen_submissions(&self, contest_id: i64) -> AppResult<Vec<ContestSubmission>>;

    async fn profile(&self, id: i64) -> AppResult<Option<Profile>>;

    async fn profile_by_username(&self, username: &str) -> AppResult<Option<Profile>>;

    async fn set_current_contest(&self, profile_id: i64, participation_id: Option<i64>) -> AppResult<()>;

    async fn is_banned(&self, contest_id: i64, profile_id: i64) -> AppResult<bool>;

    /// Problems with an accepted full-points submission by the profile
    async fn user_completed_ids(&self, profile_id: i64) -> AppResult<BTreeSet<i64>>;

    /// Problems the profile scored on but not fully
    async fn user_attempted(&self, profile_id: i64) -> AppResult<BTreeMap<i64, AttemptedProblem>>;

    async fn participation_completed_ids(&self, participation_id: i64) -> AppResult<BTreeSet<i64>>;

    async fn participation_attempted(
        &self,
        participation_id: i64,
    ) -> AppResult<BTreeMap<i64, AttemptedProblem>>;
}

/// PostgreSQL backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContestStore for PgStore {
    async fn contest_by_key(&self, key: &str) -> AppResult<Option<Contest>> {
        ContestRepository::find_by_key(&self.pool, key).await
    }

    async fn contest_by_id(&self, id: i64) -> AppResult<Option<Contest>> {
        ContestRepository::find_by_id(&self.pool, id).await
    }

    async fn contest_organizers(&self, contest_id: i64) -> AppResult<Vec<i64>> {
        ContestRepository::organizer_ids(&self.pool, contest_id).await
    }

    async fn contest_problems(&self, contest_id: i64) -> AppResult<Vec<ContestProblem>> {
        ContestRepository::problems(&self.pool, contest_id).await
    }

    async fn contest_problem(&self, id: i64) -> AppResult<Option<ContestProblem>> {
        ContestRepository::find_problem(&self.pool, id).await
    }

    async fn update_contest_format(
        &self,
        contest_id: i64,
        format_name: &str,
        format_config: Option<&serde_json::Value>,
    ) -> AppResult<Contest> {
        ContestRepository::update_format(&self.pool, contest_id, format_name, format_config).await
    }

    async fn set_contest_locked(&self, contest_id: i64, locked: bool) -> AppResult<Contest> {
        ContestRepository::set_locked(&self.pool, contest_id, locked).await
    }

    async fn update_user_count(&self, contest_id: i64) -> AppResult<i32> {
        ContestRepository::update_user_count(&self.pool, contest_id).await
    }

    async fn participation(&self, id: i64) -> AppResult<Option<ContestParticipation>> {
        ParticipationRepository::find_by_id(&self.pool, id).await
    }

    async fn find_participation(
        &self,
        contest_id: i64,
        user_id: i64,
        virtual_id: i32,
    ) -> AppResult<Option<ContestParticipation>> {
        ParticipationRepository::find(&self.pool, contest_id, user_id, virtual_id).await
    }

    async fn max_virtual_id(&self, contest_id: i64, user_id: i64) -> AppResult<i32> {
        ParticipationRepository::max_virtual_id(&self.pool, contest_id, user_id).await
    }

    async fn create_participation(&self, new: &NewParticipation) -> AppResult<ContestParticipation> {
        ParticipationRepository::create(&self.pool, new).await
    }

    async fn participation_ids(&self, contest_id: i64) -> AppResult<Vec<i64>> {
        ParticipationRepository::ids_for_contest(&self.pool, contest_id).await
    }

    async fn ranking_rows(
        &self,
        contest_id: i64,
        filter: ParticipationFilter,
    ) -> AppResult<Vec<RankingRow>> {
        ParticipationRepository::ranking_rows(&self.pool, contest_id, filter).await
    }

    async fn contest_submissions(&self, participation_id: i64) -> AppResult<Vec<ContestSubmission>> {
        SubmissionRepository::for_participation(&self.pool, participation_id).await
    }

    async fn save_results(
        &self,
        participation_id: i64,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation> {
        let mut tx = self.pool.begin().await?;
        let participation =
            ParticipationRepository::save_results(&mut tx, participation_id, results).await?;
        tx.commit().await?;
        Ok(participation)
    }

    async fn apply_disqualification(
        &self,
        participation_id: i64,
        disqualified: bool,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation> {
        let mut tx = self.pool.begin().await?;

        ParticipationRepository::set_disqualified(&mut tx, participation_id, disqualified).await?;
        let participation =
            ParticipationRepository::save_results(&mut tx, participation_id, results).await?;

        if disqualified {
            ProfileRepository::clear_current_contest(&mut tx, participation.user_id, participation.id)
                .await?;
            ContestRepository::ban(&mut tx, participation.contest_id, participation.user_id).await?;
        } else {
            ContestRepository::unban(&mut tx, participation.contest_id, participation.user_id)
                .await?;
        }

        tx.commit().await?;
        Ok(participation)
    }

    async fn submission(&self, id: i64) -> AppResult<Option<Submission>> {
        SubmissionRepository::find_by_id(&self.pool, id).await
    }

    async fn contest_submission_by_submission(
        &self,
        submission_id: i64,
    ) -> AppResult<Option<ContestSubmission>> {
        SubmissionRepository::find_contest_submission(&self.pool, submission_id).await
    }

    async fn update_contest_submission(&self, id: i64, score: &ContestSubmissionScore) -> AppResult<()> {
        SubmissionRepository::update_score(&self.pool, id, score).await
    }

    async fn mark_frozen(&self, id: i64) -> AppResult<()> {
        SubmissionRepository::mark_frozen(&self.pool, id).await
    }

    async fn frozen_submissions(&self, contest_id: i64) -> AppResult<Vec<ContestSubmission>> {
        SubmissionRepository::frozen_for_contest(&self.pool, contest_id).await
    }

    async fn profile(&self, id: i64) -> AppResult<Option<Profile>> {
        ProfileRepository::find_by_id(&self.pool, id).await
    }

    async fn profile_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        ProfileRepository::find_by_username(&self.pool, username).await
    }

    async fn set_current_contest(&self, profile_id: i64, participation_id: Option<i64>) -> AppResult<()> {
        ProfileRepository::set_current_contest(&self.pool, profile_id, participation_id).await
    }

    async fn is_banned(&self, contest_id: i64, profile_id: i64) -> AppResult<bool> {
        ContestRepository::is_banned(&self.pool, contest_id, profile_id).await
    }

    async fn user_completed_ids(&self, profile_id: i64) -> AppResult<BTreeSet<i64>> {
        SubmissionRepository::user_completed_ids(&self.pool, profile_id).await
    }

    async fn user_attempted(&self, profile_id: i64) -> AppResult<BTreeMap<i64, AttemptedProblem>> {
        SubmissionRepository::user_attempted(&self.pool, profile_id).await
    }

    async fn participation_completed_ids(&self, participation_id: i64) -> AppResult<BTreeSet<i64>> {
        SubmissionRepository::participation_completed_ids(&self.pool, participation_id).await
    }

    async fn participation_attempted(
        &self,
        participation_id: i64,
    ) -> AppResult<BTreeMap<i64, AttemptedProblem>> {
        SubmissionRepository::participation_attempted(&self.pool, participation_id).await
    }
}
