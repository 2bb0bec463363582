//! Judgeboard - contest scoring and ranking for an online judge
//!
//! Turns judged submissions into contest participation scores through
//! pluggable contest formats, manages the participation lifecycle (live,
//! spectating and virtual attempts) and renders ranked scoreboards.
//!
//! # Architecture
//!
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: join/leave, scoring and ranking logic
//! - **Formats**: contest format strategies and their registry
//! - **Store**: persistence seam over PostgreSQL repositories
//! - **Cache**: problem aggregates memoized in Redis

pub mod cache;
pub mod config;
pub mod constants;
pub mod context;
pub mod db;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod ranking;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
