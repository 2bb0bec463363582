//! Contest handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::resolve_viewer,
    middleware::auth::{AuthenticatedUser, OptionalAuth},
    services::{ContestService, RankingService, RankingView},
    state::AppState,
    utils::now_utc,
};

use super::{
    request::{DisqualifyRequest, RankingQuery, RankingScope},
    response::ParticipationResponse,
};

/// Scoreboard of a contest
pub async fn get_ranking(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(key): Path<String>,
    Query(query): Query<RankingQuery>,
) -> AppResult<Json<RankingView>> {
    let viewer = resolve_viewer(&state, user.as_ref()).await?;
    let now = now_utc();

    let view = match query.scope {
        RankingScope::Own => RankingService::own_ranking(&state, &key, &viewer, now).await?,
        RankingScope::Full => RankingService::live_ranking(&state, &key, &viewer, now).await?,
    };

    Ok(Json(view))
}

/// The requesting user's live and virtual participations
pub async fn own_participations(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
) -> AppResult<Json<RankingView>> {
    let viewer = resolve_viewer(&state, Some(&auth_user)).await?;
    let view =
        RankingService::participation_history(&state, &key, None, &viewer, now_utc()).await?;
    Ok(Json(view))
}

/// Another user's live and virtual participations
pub async fn user_participations(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path((key, username)): Path<(String, String)>,
) -> AppResult<Json<RankingView>> {
    let viewer = resolve_viewer(&state, Some(&auth_user)).await?;
    let view =
        RankingService::participation_history(&state, &key, Some(&username), &viewer, now_utc())
            .await?;
    Ok(Json(view))
}

/// Join a contest live, as a spectator or virtually
pub async fn join_contest(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
) -> AppResult<(StatusCode, Json<ParticipationResponse>)> {
    let viewer = resolve_viewer(&state, Some(&auth_user)).await?;
    let participation = ContestService::join_contest(&state, &key, &viewer, now_utc()).await?;

    let contest = state
        .store()
        .contest_by_id(participation.contest_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ParticipationResponse::new(&participation, &contest)),
    ))
}

/// Leave the contest the user is currently in
pub async fn leave_contest(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let viewer = resolve_viewer(&state, Some(&auth_user)).await?;
    ContestService::leave_contest(&state, &key, &viewer).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle disqualification of a participation (contest editors)
pub async fn toggle_disqualification(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
    Json(payload): Json<DisqualifyRequest>,
) -> AppResult<Json<ParticipationResponse>> {
    payload.validate()?;

    let viewer = resolve_viewer(&state, Some(&auth_user)).await?;
    let participation = ContestService::toggle_disqualification(
        &state,
        &key,
        &viewer,
        payload.participation_id,
        now_utc(),
    )
    .await?;

    let contest = state
        .store()
        .contest_by_id(participation.contest_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

    Ok(Json(ParticipationResponse::new(&participation, &contest)))
}
