//! User handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    cache::problems as problem_cache,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    state::AppState,
};

use super::{request::UserProblemsQuery, response::UserProblemsResponse};

/// Completed and attempted problems of a user.
///
/// Users may read their own aggregates; contest editors may read anyone's.
pub async fn get_user_problems(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<UserProblemsQuery>,
) -> AppResult<Json<UserProblemsResponse>> {
    if auth_user.id != id && !auth_user.viewer().can_edit_all_contests() {
        return Err(AppError::Forbidden(
            "You can only view your own problems".to_string(),
        ));
    }

    let (completed, attempted) = match query.participation_id {
        Some(participation_id) => {
            let participation = state
                .store()
                .participation(participation_id)
                .await?
                .filter(|p| p.user_id == id)
                .ok_or_else(|| AppError::NotFound("Participation not found".to_string()))?;

            (
                problem_cache::contest_completed_ids(&state, participation.id).await?,
                problem_cache::contest_attempted_ids(&state, participation.id).await?,
            )
        }
        None => (
            problem_cache::user_completed_ids(&state, id).await?,
            problem_cache::user_attempted_ids(&state, id).await?,
        ),
    };

    Ok(Json(UserProblemsResponse {
        profile_id: id,
        participation_id: query.participation_id,
        completed: completed.into_iter().collect(),
        attempted,
    }))
}
