//! Utility functions

pub mod points;
pub mod time;
pub mod validation;

pub use points::{format_points, round_to};
pub use time::{format_solving_time, now_utc, seconds_since};
pub use validation::validate_contest_key;
