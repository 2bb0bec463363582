//! Ranking service
//!
//! Loads participations for the different scoreboard views and hands them
//! to the ranking builder.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    context::ContestContext,
    db::ParticipationFilter,
    error::{AppError, AppResult},
    models::{ContestProblem, Viewer},
    ranking::{self, ProblemColumn, RankLabel, RankLabeling, RankedEntry},
    services::ContestService,
    state::AppState,
};

/// A rendered scoreboard
#[derive(Debug, Clone, Serialize)]
pub struct RankingView {
    pub contest_key: String,
    pub problems: Vec<ProblemColumn>,
    pub rankings: Vec<RankedEntry>,
}

/// Ranking service
pub struct RankingService;

impl RankingService {
    fn view(ctx: &ContestContext, problems: &[ContestProblem], rankings: Vec<RankedEntry>) -> RankingView {
        RankingView {
            contest_key: ctx.contest.key.clone(),
            problems: ranking::problem_columns(ctx, problems),
            rankings,
        }
    }

    /// The viewer's own virtual participation, rendered as the "-" row
    async fn current_virtual_entry(
        state: &AppState,
        ctx: &ContestContext,
        problems: &[ContestProblem],
        viewer: &Viewer,
    ) -> AppResult<Option<RankedEntry>> {
        let (Some(profile_id), Some(current)) = (viewer.profile_id, viewer.current_contest) else {
            return Ok(None);
        };
        if current.contest_id != ctx.contest.id {
            return Ok(None);
        }

        let rows = state
            .store()
            .ranking_rows(ctx.contest.id, ParticipationFilter::UserHistory(profile_id))
            .await?;

        Ok(rows
            .into_iter()
            .find(|row| {
                row.participation.id == current.participation_id && row.participation.is_virtual()
            })
            .map(|row| ranking::make_entry(ctx, problems, row, RankLabel::Current)))
    }

    /// Live scoreboard of listed users
    pub async fn live_ranking(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<RankingView> {
        let ctx = ContestService::load_context(state, key, now).await?;
        ctx.access_check(viewer)?;
        if !ctx.can_see_full_scoreboard(viewer) {
            return Err(AppError::Forbidden(
                "The scoreboard of this contest is hidden".to_string(),
            ));
        }

        Self::full_ranking(state, &ctx, viewer).await
    }

    async fn full_ranking(
        state: &AppState,
        ctx: &ContestContext,
        viewer: &Viewer,
    ) -> AppResult<RankingView> {
        let problems = state.store().contest_problems(ctx.contest.id).await?;
        let rows = state
            .store()
            .ranking_rows(ctx.contest.id, ParticipationFilter::Live)
            .await?;

        let mut rankings = Vec::with_capacity(rows.len() + 1);
        if let Some(current) = Self::current_virtual_entry(state, ctx, &problems, viewer).await? {
            rankings.push(current);
        }
        rankings.extend(ranking::build_ranking(ctx, &problems, rows, RankLabeling::Ranked));

        Ok(Self::view(ctx, &problems, rankings))
    }

    /// The viewer's own live row, or the full scoreboard if they may see it
    pub async fn own_ranking(
        state: &AppState,
        key: &str,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<RankingView> {
        let ctx = ContestService::load_context(state, key, now).await?;
        ctx.access_check(viewer)?;

        if ctx.can_see_full_scoreboard(viewer) {
            return Self::full_ranking(state, &ctx, viewer).await;
        }
        if !ctx.can_see_own_scoreboard(viewer) {
            return Err(AppError::Forbidden(
                "The scoreboard of this contest is hidden".to_string(),
            ));
        }

        let profile_id = viewer.profile_id.ok_or(AppError::Unauthorized)?;
        let problems = state.store().contest_problems(ctx.contest.id).await?;
        let rows = state
            .store()
            .ranking_rows(ctx.contest.id, ParticipationFilter::UserLive(profile_id))
            .await?;
        let rankings = ranking::build_ranking(&ctx, &problems, rows, RankLabeling::Hidden);

        Ok(Self::view(&ctx, &problems, rankings))
    }

    /// Live and virtual participations of one user, newest first
    pub async fn participation_history(
        state: &AppState,
        key: &str,
        username: Option<&str>,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<RankingView> {
        let ctx = ContestService::load_context(state, key, now).await?;
        ctx.access_check(viewer)?;

        let profile = match username {
            Some(username) => state
                .store()
                .profile_by_username(username)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?,
            None => {
                let id = viewer.profile_id.ok_or(AppError::Unauthorized)?;
                state
                    .store()
                    .profile(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
            }
        };

        let allowed = if viewer.profile_id == Some(profile.id) {
            ctx.can_see_own_scoreboard(viewer)
        } else {
            ctx.can_see_full_scoreboard(viewer)
        };
        if !allowed {
            return Err(AppError::Forbidden(
                "The scoreboard of this contest is hidden".to_string(),
            ));
        }

        let problems = state.store().contest_problems(ctx.contest.id).await?;
        let rows = state
            .store()
            .ranking_rows(ctx.contest.id, ParticipationFilter::UserHistory(profile.id))
            .await?;
        let rankings = ranking::build_ranking(&ctx, &problems, rows, RankLabeling::History);

        Ok(Self::view(&ctx, &problems, rankings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::roles;
    use crate::formats::ProblemCell;
    use crate::models::CurrentContest;
    use crate::services::ParticipationService;
    use crate::test_utils::{Harness, fixtures};
    use chrono::Duration;

    struct Setup {
        h: Harness,
        now: DateTime<Utc>,
    }

    /// Contest with two 100 point problems; alice solves one, bob half of both
    async fn setup() -> Setup {
        let h = Harness::new();
        let contest = h.add_contest(fixtures::contest(1, "round1"));
        let p1 = h.add_problem(fixtures::contest_problem(1, contest.id, 100));
        let p2 = h.add_problem(fixtures::contest_problem(2, contest.id, 100));
        h.store.insert_profile(fixtures::profile(10, "alice"));
        h.store.insert_profile(fixtures::profile(11, "bob"));

        let a = h.store.insert_participation(fixtures::participation(1, contest.id, 10, 0));
        let b = h.store.insert_participation(fixtures::participation(2, contest.id, 11, 0));
        let at = contest.start_time + Duration::minutes(10);
        h.submit(&a, &p1, 100.0, "AC", at);
        h.submit(&b, &p1, 60.0, "WA", at);
        h.submit(&b, &p2, 60.0, "WA", at);

        ParticipationService::recompute(&h.state, a.id).await.unwrap();
        ParticipationService::recompute(&h.state, b.id).await.unwrap();

        Setup {
            now: contest.start_time + Duration::minutes(30),
            h,
        }
    }

    #[tokio::test]
    async fn test_live_ranking_orders_by_score() {
        let Setup { h, now } = setup().await;
        let view = RankingService::live_ranking(&h.state, "round1", &Viewer::anonymous(), now)
            .await
            .unwrap();

        assert_eq!(view.problems.len(), 2);
        assert_eq!(view.problems[0].label, "1");
        let names: Vec<&str> = view.rankings.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice"]);
        assert_eq!(view.rankings[0].rank, RankLabel::Position(1));
        assert_eq!(view.rankings[1].rank, RankLabel::Position(2));
        assert_eq!(view.rankings[0].result_cell.points, "120");
    }

    #[tokio::test]
    async fn test_unlisted_users_are_hidden() {
        let Setup { h, now } = setup().await;
        h.store.set_unlisted(11, true);

        let view = RankingService::live_ranking(&h.state, "round1", &Viewer::anonymous(), now)
            .await
            .unwrap();
        assert_eq!(view.rankings.len(), 1);
        assert_eq!(view.rankings[0].username, "alice");
    }

    #[tokio::test]
    async fn test_disqualified_sinks() {
        let Setup { h, now } = setup().await;
        ParticipationService::set_disqualified(&h.state, 2, true).await.unwrap();

        let view = RankingService::live_ranking(&h.state, "round1", &Viewer::anonymous(), now)
            .await
            .unwrap();
        assert_eq!(view.rankings[0].username, "alice");
        assert_eq!(view.rankings[1].result_cell.points, "-9999");
        assert!(view.rankings[1].is_disqualified);
    }

    #[tokio::test]
    async fn test_current_virtual_row_is_prepended() {
        let Setup { h, now } = setup().await;
        let mut virt = fixtures::participation(3, 1, 10, 1);
        virt.score = 5.0;
        let virt = h.store.insert_participation(virt);

        let viewer = Viewer::new(10, roles::USER).with_current_contest(Some(CurrentContest {
            participation_id: virt.id,
            contest_id: 1,
        }));
        let view = RankingService::live_ranking(&h.state, "round1", &viewer, now)
            .await
            .unwrap();

        assert_eq!(view.rankings.len(), 3);
        assert_eq!(view.rankings[0].rank, RankLabel::Current);
        assert_eq!(view.rankings[0].participation_id, virt.id);
        assert_eq!(view.rankings[1].rank, RankLabel::Position(1));
    }

    #[tokio::test]
    async fn test_hidden_scoreboard() {
        let Setup { h, now } = setup().await;
        h.store.update_contest_sync(1, |c| c.hide_scoreboard = true);

        let outsider = Viewer::new(11, roles::USER);
        let err = RankingService::live_ranking(&h.state, "round1", &outsider, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let competitor = Viewer::new(11, roles::USER).with_current_contest(Some(CurrentContest {
            participation_id: 2,
            contest_id: 1,
        }));
        let own = RankingService::own_ranking(&h.state, "round1", &competitor, now)
            .await
            .unwrap();
        assert_eq!(own.rankings.len(), 1);
        assert_eq!(own.rankings[0].rank, RankLabel::Hidden);
        assert_eq!(own.rankings[0].username, "bob");
    }

    #[tokio::test]
    async fn test_history_lists_newest_first() {
        let Setup { h, now } = setup().await;
        h.store.insert_participation(fixtures::participation(3, 1, 10, 1));
        h.store.insert_participation(fixtures::participation(4, 1, 10, 2));

        let viewer = Viewer::new(10, roles::USER);
        let view = RankingService::participation_history(&h.state, "round1", None, &viewer, now)
            .await
            .unwrap();
        let ranks: Vec<String> = view.rankings.iter().map(|e| e.rank.to_string()).collect();
        assert_eq!(ranks, vec!["2", "1", "Live"]);

        assert!(matches!(
            view.rankings[2].problem_cells[0],
            ProblemCell::Scored(_)
        ));
    }

    #[tokio::test]
    async fn test_hidden_contest_is_not_found() {
        let Setup { h, now } = setup().await;
        h.store.update_contest_sync(1, |c| c.is_visible = false);

        let err = RankingService::live_ranking(&h.state, "round1", &Viewer::anonymous(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
