//! Input validation utilities

use std::sync::LazyLock;

use regex::Regex;

static CONTEST_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("contest key pattern is valid"));

/// Validate a contest key (lowercase letters and digits, at most 20 characters)
pub fn validate_contest_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() || key.len() > 20 {
        return Err("Contest key must be between 1 and 20 characters");
    }
    if !CONTEST_KEY.is_match(key) {
        return Err("Contest key must match ^[a-z0-9]+$");
    }
    Ok(())
}
