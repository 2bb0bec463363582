//! Contest participation and scoreboard handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Contest routes
pub fn routes() -> Router<AppState> {
    Router::new()
        // Scoreboards
        .route("/{key}/ranking", get(handler::get_ranking))
        .route("/{key}/participations", get(handler::own_participations))
        .route("/{key}/participations/{username}", get(handler::user_participations))
        // Participation
        .route("/{key}/join", post(handler::join_contest))
        .route("/{key}/leave", post(handler::leave_contest))
        .route("/{key}/participation/disqualify", post(handler::toggle_disqualification))
}
