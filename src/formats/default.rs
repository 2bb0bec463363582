//! Default contest format: best points per problem, time of the last
//! submission on each scored problem counts towards cumulative time.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    constants::formats,
    models::{Contest, ContestParticipation, ContestProblem, ContestSubmission, ParticipationResults},
    utils::{format_solving_time, round_to, seconds_since},
};

use super::{
    ContestFormat, FormatError, ProblemCell, ResultCell, ScoredCell, SolutionState, by_problem,
    encode_format_data, problem_data, submissions_link, validate_empty_config,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DefaultProblemData {
    time: f64,
    points: f64,
}

pub struct DefaultContestFormat {
    contest: Arc<Contest>,
}

impl DefaultContestFormat {
    pub fn new(contest: Arc<Contest>) -> Self {
        Self { contest }
    }

    pub fn validate(config: Option<&serde_json::Value>) -> Result<(), FormatError> {
        validate_empty_config(formats::DEFAULT, config)
    }
}

impl ContestFormat for DefaultContestFormat {
    fn name(&self) -> &'static str {
        formats::DEFAULT
    }

    fn update_participation(
        &self,
        participation: &ContestParticipation,
        submissions: &[ContestSubmission],
    ) -> ParticipationResults {
        let start = participation.start(&self.contest);
        let mut cumtime = 0.0;
        let mut score = 0.0;
        let mut data = BTreeMap::new();

        for (problem_id, subs) in by_problem(submissions) {
            let points = subs.iter().map(|s| s.points).fold(0.0, f64::max);
            let Some(last) = subs.iter().map(|s| s.date).max() else {
                continue;
            };

            let dt = seconds_since(start, last);
            if points != 0.0 {
                cumtime += dt;
            }
            score += points;
            data.insert(problem_id, DefaultProblemData { time: dt, points });
        }

        ParticipationResults {
            score: round_to(score, self.contest.points_precision),
            cumtime: cumtime.max(0.0) as i64,
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
        let Some(data) = problem_data::<DefaultProblemData>(participation, problem.id)? else {
            return Ok(ProblemCell::Empty);
        };

        let mut cell = ScoredCell::new(
            SolutionState::from_points(data.points, problem.points as f64),
            data.points,
            submissions_link(&self.contest.key, username, problem),
        );
        cell.time = Some(format_solving_time(data.time));
        cell.pretest = problem.is_pretested;

        Ok(ProblemCell::Scored(cell))
    }

    fn display_participation_result(&self, participation: &ContestParticipation) -> ResultCell {
        ResultCell::with_time(
            participation.score,
            self.contest.points_precision,
            participation.cumtime,
        )
    }
}
