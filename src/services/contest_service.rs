//! Contest service

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    constants::participation::{LIVE, SPECTATE},
    context::ContestContext,
    error::{AppError, AppResult},
    models::{Contest, ContestParticipation, CurrentContest, NewParticipation, Viewer},
    services::ParticipationService,
    state::AppState,
    tasks::{RescoreFailure, RescoreReport},
};

/// Result of locking or unlocking a contest
#[derive(Debug)]
pub struct LockOutcome {
    pub contest: Contest,
    /// Participations recomputed from submissions judged while locked
    pub propagated: usize,
    /// Frozen submissions or participations that could not be applied
    pub failures: Vec<RescoreFailure>,
}

/// Contest service for business logic
pub struct ContestService;

impl ContestService {
    /// Build the request-scoped context of a contest
    pub async fn load_context(
        state: &AppState,
        key: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ContestContext> {
        let contest = state
            .store()
            .contest_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;
        let organizers = state.store().contest_organizers(contest.id).await?;

        ContestContext::new(contest, organizers, state.formats(), now)
    }

    /// Resolve the viewer of a request, including the contest they are in
    pub async fn viewer(state: &AppState, profile_id: i64, role: &str) -> AppResult<Viewer> {
        let profile = state
            .store()
            .profile(profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let current = match profile.current_contest {
            Some(participation_id) => state
                .store()
                .participation(participation_id)
                .await?
                .map(|p| CurrentContest {
                    participation_id: p.id,
                    contest_id: p.contest_id,
                }),
            None => None,
        };

        Ok(Viewer::new(profile.id, role).with_current_contest(current))
    }

    async fn get_or_create(
        state: &AppState,
        contest_id: i64,
        user_id: i64,
        virtual_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ContestParticipation> {
        let store = state.store();
        if let Some(existing) = store.find_participation(contest_id, user_id, virtual_id).await? {
            return Ok(existing);
        }

        let new = NewParticipation {
            contest_id,
            user_id,
            virtual_id,
            real_start: now,
        };
        match store.create_participation(&new).await {
            Ok(created) => Ok(created),
            // Someone else created it first
            Err(e) if e.is_integrity_violation() => store
                .find_participation(contest_id, user_id, virtual_id)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }

    /// Allocate the next virtual participation, retrying lost races with
    /// exponential backoff and jitter.
    async fn create_virtual(
        state: &AppState,
        contest_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<ContestParticipation> {
        let join = &state.config().join;
        let mut delay_ms = join.retry_base_delay_ms;

        for attempt in 1..=join.max_retries {
            let virtual_id = (state.store().max_virtual_id(contest_id, user_id).await? + 1).max(1);
            let new = NewParticipation {
                contest_id,
                user_id,
                virtual_id,
                real_start: now,
            };

            match state.store().create_participation(&new).await {
                Ok(participation) => return Ok(participation),
                Err(e) if e.is_integrity_violation() => {
                    tracing::debug!(
                        contest_id,
                        user_id,
                        virtual_id,
                        attempt,
                        "Lost virtual participation race, retrying"
                    );
                    let jitter = rand::rng().random_range(0..=delay_ms);
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = delay_ms.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a virtual participation, please try again".to_string(),
        ))
    }

    /// Join a contest.
    ///
    /// Running contests give a live participation (spectating for editors).
    /// Ended virtualable contests give a fresh virtual participation.
    pub async fn join_contest(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<ContestParticipation> {
        let ctx = Self::load_context(state, key, now).await?;
        ctx.access_check(viewer)?;
        let profile_id = viewer.profile_id.ok_or(AppError::Unauthorized)?;
        let is_editor = ctx.is_editable_by(viewer);
        let contest_id = ctx.contest.id;

        if !ctx.can_join && !is_editor {
            return Err(AppError::Forbidden(format!(
                "\"{}\" is not currently ongoing",
                ctx.contest.name
            )));
        }

        if viewer.current_contest.is_some() {
            return Err(AppError::Conflict("You are already in a contest".to_string()));
        }

        if !ctx.is_joinable_by(viewer) {
            return Err(AppError::Forbidden(format!(
                "You do not have permission to join \"{}\"",
                ctx.contest.name
            )));
        }

        if !viewer.is_superuser() && state.store().is_banned(contest_id, profile_id).await? {
            return Err(AppError::Forbidden(
                "You are permanently barred from joining this contest".to_string(),
            ));
        }

        let participation = if ctx.ended {
            Self::create_virtual(state, contest_id, profile_id, now).await?
        } else {
            let kind = if is_editor { SPECTATE } else { LIVE };
            let participation = Self::get_or_create(state, contest_id, profile_id, kind, now).await?;
            if participation.ended(&ctx.contest, now) {
                Self::get_or_create(state, contest_id, profile_id, SPECTATE, now).await?
            } else {
                participation
            }
        };

        state
            .store()
            .set_current_contest(profile_id, Some(participation.id))
            .await?;
        state.store().update_user_count(contest_id).await?;

        tracing::info!(
            contest = %ctx.contest.key,
            user_id = profile_id,
            participation = %participation.kind(),
            "Joined contest"
        );

        Ok(participation)
    }

    /// Leave the contest the viewer is currently in
    pub async fn leave_contest(state: &AppState, key: &str, viewer: &Viewer) -> AppResult<()> {
        let profile_id = viewer.profile_id.ok_or(AppError::Unauthorized)?;
        let contest = state
            .store()
            .contest_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

        match viewer.current_contest {
            Some(current) if current.contest_id == contest.id => {
                state.store().set_current_contest(profile_id, None).await
            }
            _ => Err(AppError::NotFound(format!(
                "You are not in contest \"{}\"",
                contest.key
            ))),
        }
    }

    /// Drop the viewer's current contest if it ended or became inaccessible.
    ///
    /// Returns whether it was cleared.
    pub async fn update_profile_contest(
        state: &AppState,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let (Some(profile_id), Some(current)) = (viewer.profile_id, viewer.current_contest) else {
            return Ok(false);
        };

        let stale = match state.store().participation(current.participation_id).await? {
            None => true,
            Some(participation) => match state.store().contest_by_id(participation.contest_id).await? {
                None => true,
                Some(contest) => {
                    let organizers = state.store().contest_organizers(contest.id).await?;
                    let ended = participation.ended(&contest, now);
                    let ctx = ContestContext::new(contest, organizers, state.formats(), now)?;
                    ended || !ctx.is_accessible_by(viewer)
                }
            },
        };

        if stale {
            state.store().set_current_contest(profile_id, None).await?;
        }
        Ok(stale)
    }

    fn require_editor(ctx: &ContestContext, viewer: &Viewer) -> AppResult<()> {
        ctx.access_check(viewer)?;
        if !ctx.is_editable_by(viewer) {
            return Err(AppError::Forbidden(
                "You cannot edit this contest".to_string(),
            ));
        }
        Ok(())
    }

    /// Queue a background rescore of every participation of a contest
    pub fn dispatch_rescore(state: &AppState, contest: &Contest) -> Uuid {
        let job_state = state.clone();
        let contest_id = contest.id;
        state.tasks().spawn(format!("rescore contest {}", contest.key), async move {
            ParticipationService::recompute_all(&job_state, contest_id).await
        })
    }

    /// Change the format of a contest and rescore it in the background.
    ///
    /// The change is committed before the rescore job is queued; a failing
    /// job does not undo it.
    pub async fn update_format(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        format_name: &str,
        format_config: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> AppResult<(Contest, Uuid)> {
        let ctx = Self::load_context(state, key, now).await?;
        Self::require_editor(&ctx, viewer)?;

        let mut updated = Contest::clone(&ctx.contest);
        updated.format_name = format_name.to_string();
        updated.format_config = format_config.clone();
        updated.clean(state.formats())?;

        let contest = state
            .store()
            .update_contest_format(ctx.contest.id, format_name, format_config.as_ref())
            .await?;

        let job_id = Self::dispatch_rescore(state, &contest);
        tracing::info!(contest = %contest.key, format = %format_name, %job_id, "Contest format changed");

        Ok((contest, job_id))
    }

    /// Toggle disqualification of a participation in a contest the viewer edits
    pub async fn toggle_disqualification(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        participation_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<ContestParticipation> {
        let ctx = Self::load_context(state, key, now).await?;
        Self::require_editor(&ctx, viewer)?;

        match state.store().participation(participation_id).await? {
            Some(p) if p.contest_id == ctx.contest.id => {
                ParticipationService::toggle_disqualified(state, participation_id).await
            }
            _ => Err(AppError::NotFound("Participation not found".to_string())),
        }
    }

    pub async fn rescore(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<Uuid> {
        let ctx = Self::load_context(state, key, now).await?;
        Self::require_editor(&ctx, viewer)?;
        Ok(Self::dispatch_rescore(state, &ctx.contest))
    }

    /// Lock or unlock a contest. Unlocking applies everything judged while
    /// the contest was locked.
    pub async fn set_locked(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        locked: bool,
        now: DateTime<Utc>,
    ) -> AppResult<LockOutcome> {
        let ctx = Self::load_context(state, key, now).await?;
        ctx.access_check(viewer)?;
        if !viewer.can_lock_contests() {
            return Err(AppError::Forbidden(
                "You cannot lock contests".to_string(),
            ));
        }

        let contest = state.store().set_contest_locked(ctx.contest.id, locked).await?;

        // The lock change is committed; propagation problems are reported, not raised
        let report = if locked {
            RescoreReport::default()
        } else {
            ParticipationService::propagate_frozen(state, contest.id)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(contest = %contest.key, error = %e, "Failed to load frozen submissions");
                    RescoreReport::default()
                })
        };

        tracing::info!(
            contest = %contest.key,
            locked,
            propagated = report.succeeded,
            failed = report.failures.len(),
            "Contest lock changed"
        );
        Ok(LockOutcome {
            contest,
            propagated: report.succeeded,
            failures: report.failures,
        })
    }
}
