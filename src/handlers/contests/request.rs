//! Contest request DTOs

use serde::Deserialize;
use validator::Validate;

/// Which scoreboard to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingScope {
    /// The full scoreboard, or the viewer's own row when it is hidden
    #[default]
    Own,
    /// The full scoreboard only
    Full,
}

/// Ranking query parameters
#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    pub scope: RankingScope,
}

/// Toggle disqualification of a participation
#[derive(Debug, Deserialize, Validate)]
pub struct DisqualifyRequest {
    #[validate(range(min = 1))]
    pub participation_id: i64,
}
