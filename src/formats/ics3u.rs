//! ICS3U contest format: best points per problem, no time penalty.
//!
//! A problem is flagged disqualified when any submission achieving its best
//! points was disqualified.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    constants::formats,
    models::{Contest, ContestParticipation, ContestProblem, ContestSubmission, ParticipationResults},
};

use super::{
    ContestFormat, FormatError, ProblemCell, ResultCell, ScoredCell, SolutionState, by_problem,
    encode_format_data, problem_data, submissions_link, validate_empty_config,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ics3uProblemData {
    points: f64,
    disqualified: bool,
}

pub struct Ics3uContestFormat {
    contest: Arc<Contest>,
}

impl Ics3uContestFormat {
    pub fn new(contest: Arc<Contest>) -> Self {
        Self { contest }
    }

    pub fn validate(config: Option<&serde_json::Value>) -> Result<(), FormatError> {
        validate_empty_config("ICS3U", config)
    }
}

impl ContestFormat for Ics3uContestFormat {
    fn name(&self) -> &'static str {
        formats::ICS3U
    }

    fn update_participation(
        &self,
        _participation: &ContestParticipation,
        submissions: &[ContestSubmission],
    ) -> ParticipationResults {
        let mut score = 0.0;
        let mut data = BTreeMap::new();

        for (problem_id, subs) in by_problem(submissions) {
            let points = subs.iter().map(|s| s.points).fold(f64::MIN, f64::max);
            let disqualified = subs
                .iter()
                .filter(|s| s.points == points)
                .any(|s| s.is_disqualified);

            score += points;
            data.insert(problem_id, Ics3uProblemData { points, disqualified });
        }

        ParticipationResults {
            score,
            cumtime: 0,
            tiebreaker: 0.0,
            format_data: encode_format_data(data),
        }
    }

    fn display_user_problem(
        &self,
        participation: &ContestParticipation,
        username: &str,
        problem: &ContestProblem,
    ) -> Result<ProblemCell, FormatError> {
        let Some(data) = problem_data::<Ics3uProblemData>(participation, problem.id)? else {
            return Ok(ProblemCell::Empty);
        };

        let mut cell = ScoredCell::new(
            SolutionState::from_points(data.points, problem.points as f64),
            data.points,
            submissions_link(&self.contest.key, username, problem),
        );
        cell.disqualified = data.disqualified;

        Ok(ProblemCell::Scored(cell))
    }

    fn display_participation_result(&self, participation: &ContestParticipation) -> ResultCell {
        ResultCell::points_only(participation.score, self.contest.points_precision)
    }
}
