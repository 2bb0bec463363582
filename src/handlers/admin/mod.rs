//! Contest administration handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        // Contest management
        .route("/contests/{key}/format", put(handler::update_format))
        .route("/contests/{key}/lock", post(handler::set_locked))
        .route("/contests/{key}/rescore", post(handler::rescore_contest))
        // Background jobs
        .route("/tasks/{id}", get(handler::get_task))
        // Participations
        .route("/participations/recompute", post(handler::recompute_participations))
        .route("/participations/{id}/disqualify", post(handler::set_disqualified))
        // Judge callback
        .route("/submissions/{id}/judged", post(handler::submission_judged))
}
