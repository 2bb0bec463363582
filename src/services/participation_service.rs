//! Participation scoring service
//!
//! Recomputes participation results through the contest format, toggles
//! disqualification and ingests judged submissions.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::{
    cache::problems as problem_cache,
    error::{AppError, AppResult},
    formats::ContestFormat,
    models::{
        Contest, ContestParticipation, ContestProblem, ContestSubmission, ContestSubmissionScore,
        Submission,
    },
    state::AppState,
    tasks::RescoreReport,
};

/// Participations recomputed concurrently by a bulk recompute
const RECOMPUTE_CONCURRENCY: usize = 8;

/// What happened to a judged submission
#[derive(Debug, Clone, PartialEq)]
pub enum JudgedOutcome {
    /// The submission was not made in a contest
    NotInContest,
    /// The contest is locked; the score is applied when it is unlocked
    Frozen { participation_id: i64 },
    Scored { participation: ContestParticipation },
}

/// Participation service for scoring logic
pub struct ParticipationService;

impl ParticipationService {
    async fn load_participation(state: &AppState, id: i64) -> AppResult<ContestParticipation> {
        state
            .store()
            .participation(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participation not found".to_string()))
    }

    async fn load_contest(state: &AppState, id: i64) -> AppResult<Arc<Contest>> {
        state
            .store()
            .contest_by_id(id)
            .await?
            .map(Arc::new)
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }

    async fn recompute_with(
        state: &AppState,
        format: &dyn ContestFormat,
        participation: &ContestParticipation,
    ) -> AppResult<ContestParticipation> {
        let submissions = state.store().contest_submissions(participation.id).await?;
        let results = format.update_participation(participation, &submissions);
        state.store().save_results(participation.id, &results).await
    }

    /// Recompute score, cumtime, tiebreaker and format data of a participation
    pub async fn recompute(state: &AppState, participation_id: i64) -> AppResult<ContestParticipation> {
        let participation = Self::load_participation(state, participation_id).await?;
        let contest = Self::load_contest(state, participation.contest_id).await?;
        let format = state.formats().build(contest)?;

        Self::recompute_with(state, format.as_ref(), &participation).await
    }

    /// Recompute every participation of a contest.
    ///
    /// A failing participation is recorded in the report and does not stop
    /// the remaining ones.
    pub async fn recompute_all(state: &AppState, contest_id: i64) -> AppResult<RescoreReport> {
        let contest = Self::load_contest(state, contest_id).await?;
        let format = state.formats().build(contest.clone())?;
        let ids = state.store().participation_ids(contest_id).await?;

        let mut report = RescoreReport::default();
        for id in ids {
            let outcome = match Self::load_participation(state, id).await {
                Ok(participation) => {
                    Self::recompute_with(state, format.as_ref(), &participation).await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(_) => report.record_success(),
                Err(e) => {
                    tracing::error!(
                        contest = %contest.key,
                        participation_id = id,
                        error = %e,
                        "Failed to rescore participation"
                    );
                    report.record_failure(id, e.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Recompute the given participations, possibly from different contests
    pub async fn recompute_many(state: &AppState, ids: &[i64]) -> RescoreReport {
        let outcomes: Vec<(i64, AppResult<ContestParticipation>)> = stream::iter(ids.iter().copied())
            .map(|id| async move { (id, Self::recompute(state, id).await) })
            .buffered(RECOMPUTE_CONCURRENCY)
            .collect()
            .await;

        let mut report = RescoreReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(participation) => {
                    Self::evict_caches(state, &participation).await;
                    report.record_success();
                }
                Err(e) => {
                    tracing::error!(participation_id = id, error = %e, "Failed to recompute participation");
                    report.record_failure(id, e.to_string());
                }
            }
        }
        report
    }

    /// Set or clear disqualification.
    ///
    /// The flag, the recomputed results, the owner's current contest and the
    /// contest ban list change together.
    pub async fn set_disqualified(
        state: &AppState,
        participation_id: i64,
        disqualified: bool,
    ) -> AppResult<ContestParticipation> {
        let participation = Self::load_participation(state, participation_id).await?;
        let contest = Self::load_contest(state, participation.contest_id).await?;
        let format = state.formats().build(contest.clone())?;

        let submissions = state.store().contest_submissions(participation.id).await?;
        let results = format.update_participation(&participation, &submissions);
        let updated = state
            .store()
            .apply_disqualification(participation.id, disqualified, &results)
            .await?;

        tracing::info!(
            contest = %contest.key,
            participation_id,
            user_id = updated.user_id,
            disqualified,
            "Participation disqualification changed"
        );

        Ok(updated)
    }

    pub async fn toggle_disqualified(
        state: &AppState,
        participation_id: i64,
    ) -> AppResult<ContestParticipation> {
        let participation = Self::load_participation(state, participation_id).await?;
        Self::set_disqualified(state, participation_id, !participation.is_disqualified).await
    }

    /// Contest points a judged submission is worth
    pub fn contest_points(submission: &Submission, problem: &ContestProblem) -> f64 {
        let scaled = submission
            .scaled_points(problem.points as f64)
            .unwrap_or(0.0);

        if !problem.partial && scaled != problem.points as f64 {
            0.0
        } else {
            scaled
        }
    }

    fn is_first_submission(current: &ContestSubmission, all: &[ContestSubmission]) -> bool {
        all.iter()
            .filter(|s| s.problem_id == current.problem_id)
            .min_by_key(|s| (s.date, s.id))
            .is_none_or(|first| first.id == current.id)
    }

    /// Score a contest submission without propagating it
    async fn score_submission(
        state: &AppState,
        submission: &Submission,
        contest_submission: &ContestSubmission,
    ) -> AppResult<(Arc<Contest>, ContestParticipation, ContestSubmissionScore)> {
        let participation =
            Self::load_participation(state, contest_submission.participation_id).await?;
        let contest = Self::load_contest(state, participation.contest_id).await?;
        let problem = state
            .store()
            .contest_problem(contest_submission.problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest problem not found".to_string()))?;

        let format = state.formats().build(contest.clone())?;
        let siblings = state.store().contest_submissions(participation.id).await?;

        let points = Self::contest_points(submission, &problem);
        let bonus = format.submission_bonus(
            &participation,
            &problem,
            points,
            submission.date,
            Self::is_first_submission(contest_submission, &siblings),
        );

        let score = ContestSubmissionScore {
            points,
            bonus,
            is_pretest: submission.is_pretested,
        };
        Ok((contest, participation, score))
    }

    async fn evict_caches(state: &AppState, participation: &ContestParticipation) {
        problem_cache::evict_participation(state, participation.id).await;
        problem_cache::evict_user(state, participation.user_id).await;
    }

    /// Apply the judge's result for a submission to its contest participation.
    ///
    /// While the contest is locked the contest submission is only flagged and
    /// the scoreboard keeps its old values.
    pub async fn record_judged_submission(
        state: &AppState,
        submission_id: i64,
    ) -> AppResult<JudgedOutcome> {
        let submission = state
            .store()
            .submission(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        let Some(contest_submission) = state
            .store()
            .contest_submission_by_submission(submission_id)
            .await?
        else {
            problem_cache::evict_user(state, submission.user_id).await;
            return Ok(JudgedOutcome::NotInContest);
        };

        let (contest, participation, score) =
            Self::score_submission(state, &submission, &contest_submission).await?;

        if contest.is_locked {
            state.store().mark_frozen(contest_submission.id).await?;
            tracing::debug!(
                contest = %contest.key,
                submission_id,
                "Contest locked, deferring submission score"
            );
            return Ok(JudgedOutcome::Frozen {
                participation_id: participation.id,
            });
        }

        state
            .store()
            .update_contest_submission(contest_submission.id, &score)
            .await?;
        let participation = Self::recompute(state, participation.id).await?;
        Self::evict_caches(state, &participation).await;

        Ok(JudgedOutcome::Scored { participation })
    }

    async fn apply_frozen(state: &AppState, contest_submission: &ContestSubmission) -> AppResult<()> {
        let submission = state
            .store()
            .submission(contest_submission.submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
        let (_, _, score) = Self::score_submission(state, &submission, contest_submission).await?;
        state
            .store()
            .update_contest_submission(contest_submission.id, &score)
            .await
    }

    /// Apply every submission judged while the contest was locked, then
    /// recompute the affected participations once each.
    ///
    /// A submission that cannot be applied is reported and keeps its frozen
    /// flag; the rest of the contest is still propagated.
    pub async fn propagate_frozen(state: &AppState, contest_id: i64) -> AppResult<RescoreReport> {
        let frozen = state.store().frozen_submissions(contest_id).await?;
        let mut report = RescoreReport::default();
        let mut affected = BTreeSet::new();

        for contest_submission in &frozen {
            if let Err(e) = Self::apply_frozen(state, contest_submission).await {
                tracing::error!(
                    contest_submission_id = contest_submission.id,
                    participation_id = contest_submission.participation_id,
                    error = %e,
                    "Failed to apply frozen submission"
                );
                report.record_failure(
                    contest_submission.participation_id,
                    format!("contest submission {}: {}", contest_submission.id, e),
                );
            }
            affected.insert(contest_submission.participation_id);
        }

        for id in affected {
            match Self::recompute(state, id).await {
                Ok(participation) => {
                    Self::evict_caches(state, &participation).await;
                    report.record_success();
                }
                Err(e) => {
                    tracing::error!(participation_id = id, error = %e, "Failed to apply frozen results");
                    report.record_failure(id, e.to_string());
                }
            }
        }

        Ok(report)
    }
}
