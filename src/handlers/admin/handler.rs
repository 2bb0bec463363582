//! Admin handler implementations

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    models::Viewer,
    services::{ContestService, ParticipationService},
    state::AppState,
    tasks::JobStatus,
    utils::now_utc,
};

use super::{
    request::{LockRequest, RecomputeRequest, SetDisqualifiedRequest, UpdateFormatRequest},
    response::{
        DisqualifyResponse, FormatUpdateResponse, JobResponse, JudgedResponse, LockResponse,
    },
};

fn require_superuser(viewer: &Viewer) -> AppResult<()> {
    if viewer.can_edit_all_contests() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Change a contest's format and queue a rescore
pub async fn update_format(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
    Json(payload): Json<UpdateFormatRequest>,
) -> AppResult<(StatusCode, Json<FormatUpdateResponse>)> {
    payload.validate()?;

    let (contest, job_id) = ContestService::update_format(
        &state,
        &key,
        &auth_user.viewer(),
        &payload.format_name,
        payload.format_config,
        now_utc(),
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(FormatUpdateResponse {
            contest_key: contest.key,
            format_name: contest.format_name,
            format_config: contest.format_config,
            job_id,
        }),
    ))
}

/// Lock or unlock a contest
pub async fn set_locked(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
    Json(payload): Json<LockRequest>,
) -> AppResult<Json<LockResponse>> {
    let outcome =
        ContestService::set_locked(&state, &key, &auth_user.viewer(), payload.locked, now_utc())
            .await?;

    Ok(Json(LockResponse {
        contest_key: outcome.contest.key,
        is_locked: outcome.contest.is_locked,
        propagated: outcome.propagated,
        failures: outcome.failures,
    }))
}

/// Queue a rescore of every participation of a contest
pub async fn rescore_contest(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(key): Path<String>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let job_id = ContestService::rescore(&state, &key, &auth_user.viewer(), now_utc()).await?;
    Ok((StatusCode::ACCEPTED, Json(JobResponse { job_id })))
}

/// Poll a background job
pub async fn get_task(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobStatus>> {
    if !auth_user.viewer().can_edit_own_contests() {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }

    state
        .tasks()
        .status(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

/// Recompute a batch of participations in the background
pub async fn recompute_participations(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<RecomputeRequest>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    require_superuser(&auth_user.viewer())?;
    payload.validate()?;

    let job_state = state.clone();
    let ids = payload.participation_ids;
    let job_id = state.tasks().spawn(
        format!("recompute {} participations", ids.len()),
        async move { Ok(ParticipationService::recompute_many(&job_state, &ids).await) },
    );

    Ok((StatusCode::ACCEPTED, Json(JobResponse { job_id })))
}

/// Set or clear disqualification of any participation
pub async fn set_disqualified(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<SetDisqualifiedRequest>,
) -> AppResult<Json<DisqualifyResponse>> {
    require_superuser(&auth_user.viewer())?;

    let participation =
        ParticipationService::set_disqualified(&state, id, payload.disqualified).await?;

    Ok(Json(DisqualifyResponse {
        participation_id: participation.id,
        is_disqualified: participation.is_disqualified,
        score: participation.score,
    }))
}

/// Judge callback: a submission finished grading
pub async fn submission_judged(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<JudgedResponse>> {
    require_superuser(&auth_user.viewer())?;

    let outcome = ParticipationService::record_judged_submission(&state, id).await?;
    Ok(Json(outcome.into()))
}
