//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod admin;
pub mod contests;
pub mod health;
pub mod users;

use axum::{Router, middleware};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    constants::API_BASE_PATH,
    error::AppResult,
    middleware::{
        AuthenticatedUser,
        auth::{auth_middleware, optional_auth_middleware},
        logging_middleware,
    },
    models::Viewer,
    services::ContestService,
    state::AppState,
    utils::now_utc,
};

/// The served application: API routes under the base path plus the
/// logging, trace, compression and CORS layers
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, routes(state.clone()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Create all API routes
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/users", users::routes())
        .nest("/contests", contests::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .nest(
            "/admin",
            admin::routes().route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

/// Resolve the viewer of a request.
///
/// A current contest that ended or became inaccessible is dropped first, so
/// the returned viewer never points at a stale participation.
pub async fn resolve_viewer(state: &AppState, user: Option<&AuthenticatedUser>) -> AppResult<Viewer> {
    let Some(user) = user else {
        return Ok(Viewer::anonymous());
    };

    let viewer = ContestService::viewer(state, user.id, &user.role).await?;
    if ContestService::update_profile_contest(state, &viewer, now_utc()).await? {
        return Ok(viewer.with_current_contest(None));
    }
    Ok(viewer)
}
