//! Bonuses contest format
//!
//! Submissions carry bonus points on top of their judged points. The best
//! total per problem counts, timed by the earliest submission reaching it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constants::formats,
    models::{Contest, ContestParticipation, ContestProblem, ContestSubmission, ParticipationResults},
    utils::{format_points, format_solving_time, seconds_since},
};

use super::{
    ContestFormat, FormatError, ProblemCell, ResultCell, ScoredCell, SolutionState, by_problem,
    encode_format_data, problem_data, submissions_link,
};

const CONFIG_KEYS: [&str; 2] = ["time_bonus", "first_submission_bonus"];

/// Bonus settings of a contest
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusesConfig {
    /// Award one point per this many minutes left when a problem is solved
    pub time_bonus: i64,
    /// Points for fully solving a problem on the first submission
    pub first_submission_bonus: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BonusesProblemData {
    points: f64,
    bonus: f64,
    time: f64,
    #[serde(default)]
    first_solve: bool,
}

pub struct BonusesContestFormat {
    contest: Arc<Contest>,
    config: BonusesConfig,
}

impl BonusesContestFormat {
    pub fn new(contest: Arc<Contest>) -> Result<Self, FormatError> {
        let config = Self::parse_config(contest.format_config.as_ref())?;
        Ok(Self { contest, config })
    }

    pub fn config(&self) -> BonusesConfig {
        self.config
    }

    pub fn validate(config: Option<&serde_json::Value>) -> Result<(), FormatError> {
        Self::parse_config(config).map(|_| ())
    }

    fn parse_config(config: Option<&serde_json::Value>) -> Result<BonusesConfig, FormatError> {
        let Some(serde_json::Value::Object(map)) = config else {
            return Err(FormatError::InvalidConfig(
                "bonuses contest expects a dict as config".to_string(),
            ));
        };

        if let Some(key) = map.keys().find(|k| !CONFIG_KEYS.contains(&k.as_str())) {
            return Err(FormatError::InvalidConfig(format!(
                "unknown config key \"{}\"",
                key
            )));
        }

        serde_json::from_value(serde_json::Value::Object(map.clone()))
            .map_err(|e| FormatError::InvalidConfig(format!("invalid bonuses config: {}", e)))
    }
}

impl ContestFormat for BonusesContestFormat {
    fn name(&self) -> &'static str {
        formats::BONUSES
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
            let best_total = subs.iter().map(|s| s.total()).fold(f64::MIN, f64::max);
            let best: Vec<_> = subs.iter().filter(|s| s.total() == best_total).collect();

            let Some(time) = best.iter().map(|s| s.date).min() else {
                continue;
            };
            let points = best.iter().map(|s| s.points).fold(f64::MIN, f64::max);

            let dt = seconds_since(start, time);
            if best_total != 0.0 {
                score += best_total;
                cumtime += dt;
            }

            // Whether the earliest submission on the problem was already a full solve
            let first_solve = subs
                .iter()
                .map(|s| s.date)
                .min()
                .is_some_and(|first| {
                    subs.iter()
                        .filter(|s| s.date == first)
                        .any(|s| s.points == s.problem_points as f64)
                });

            data.insert(
                problem_id,
                BonusesProblemData {
                    points,
                    bonus: best_total - points,
                    time: dt,
                    first_solve,
                },
            );
        }

        ParticipationResults {
            score,
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
        let Some(data) = problem_data::<BonusesProblemData>(participation, problem.id)? else {
            return Ok(ProblemCell::Empty);
        };

        let mut cell = ScoredCell::new(
            SolutionState::from_points(data.points, problem.points as f64),
            data.points,
            submissions_link(&self.contest.key, username, problem),
        );
        cell.time = Some(format_solving_time(data.time));
        cell.first_solve = data.first_solve;
        if data.bonus != 0.0 {
            cell.bonus = Some(format!("+{}", format_points(data.bonus, 1)));
        }

        Ok(ProblemCell::Scored(cell))
    }

    fn display_participation_result(&self, participation: &ContestParticipation) -> ResultCell {
        ResultCell::with_time(
            participation.score,
            self.contest.points_precision,
            participation.cumtime,
        )
    }

    fn submission_bonus(
        &self,
        participation: &ContestParticipation,
        problem: &ContestProblem,
        points: f64,
        submitted_at: DateTime<Utc>,
        is_first_submission: bool,
    ) -> i32 {
        if points != problem.points as f64 {
            return 0;
        }

        let mut bonus = 0;
        if self.config.time_bonus > 0 {
            let remaining = participation.end_time(&self.contest) - submitted_at;
            let minutes = remaining.num_minutes().max(0);
            bonus += (minutes / self.config.time_bonus) as i32;
        }
        if is_first_submission {
            bonus += self.config.first_submission_bonus;
        }
        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use chrono::Duration;
    use serde_json::json;

    fn contest(config: serde_json::Value) -> Arc<Contest> {
        let mut contest = fixtures::contest(1, "bonus");
        contest.format_name = formats::BONUSES.to_string();
        contest.format_config = Some(config);
        Arc::new(contest)
    }

    #[test]
    fn test_validate() {
        assert!(BonusesContestFormat::validate(Some(&json!({}))).is_ok());
        assert!(BonusesContestFormat::validate(Some(&json!({"time_bonus": 5}))).is_ok());
        assert!(BonusesContestFormat::validate(None).is_err());
        assert!(BonusesContestFormat::validate(Some(&json!([]))).is_err());

        let err = BonusesContestFormat::validate(Some(&json!({"speed": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "unknown config key \"speed\"");
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let format = BonusesContestFormat::new(contest(json!({"first_submission_bonus": 3}))).unwrap();
        assert_eq!(
            format.config(),
            BonusesConfig {
                time_bonus: 0,
                first_submission_bonus: 3
            }
        );
    }

    #[test]
    fn test_best_total_and_first_solve() {
        let contest = contest(json!({}));
        let format = BonusesContestFormat::new(contest.clone()).unwrap();
        let p = fixtures::participation(1, 1, 10, 0);
        let at = |mins| contest.start_time + Duration::minutes(mins);

        let mut bonus_sub = fixtures::contest_submission(2, 1, 100, 100.0, at(20));
        bonus_sub.bonus = 5;
        let subs = vec![
            fixtures::contest_submission(1, 1, 100, 100.0, at(10)),
            bonus_sub,
            fixtures::contest_submission(3, 2, 100, 100.0, at(5)),
            fixtures::contest_submission(4, 3, 100, 0.0, at(50)),
        ];

        let results = format.update_participation(&p, &subs);
        assert_eq!(results.score, 205.0);
        assert_eq!(results.cumtime, 25 * 60);

        let data = &results.format_data;
        assert_eq!(data["1"]["bonus"], 5.0);
        assert_eq!(data["1"]["time"], 1200.0);
        assert_eq!(data["1"]["first_solve"], true);
        assert_eq!(data["2"]["first_solve"], true);
        assert_eq!(data["3"]["first_solve"], false);
        assert_eq!(data["3"]["points"], 0.0);
    }

    #[test]
    fn test_first_solve_requires_full_first_submission() {
        let contest = contest(json!({}));
        let format = BonusesContestFormat::new(contest.clone()).unwrap();
        let p = fixtures::participation(1, 1, 10, 0);

        let subs = vec![
            fixtures::contest_submission(1, 1, 100, 40.0, contest.start_time),
            fixtures::contest_submission(
                2,
                1,
                100,
                100.0,
                contest.start_time + Duration::minutes(1),
            ),
        ];
        let results = format.update_participation(&p, &subs);
        assert_eq!(results.format_data["1"]["first_solve"], false);
    }

    #[test]
    fn test_submission_bonus() {
        let contest = contest(json!({"time_bonus": 10, "first_submission_bonus": 2}));
        let format = BonusesContestFormat::new(contest.clone()).unwrap();
        let p = fixtures::participation(1, 1, 10, 0);
        let problem = fixtures::contest_problem(1, 1, 100);
        let at = contest.end_time - Duration::minutes(35);

        assert_eq!(format.submission_bonus(&p, &problem, 100.0, at, false), 3);
        assert_eq!(format.submission_bonus(&p, &problem, 100.0, at, true), 5);
        assert_eq!(format.submission_bonus(&p, &problem, 60.0, at, true), 0);
    }

    #[test]
    fn test_display_shows_bonus() {
        let contest = contest(json!({}));
        let format = BonusesContestFormat::new(contest).unwrap();
        let mut p = fixtures::participation(1, 1, 10, 0);
        p.format_data = Some(json!({
            "1": {"points": 100.0, "bonus": 4.0, "time": 90.0, "first_solve": true}
        }));

        let problem = fixtures::contest_problem(1, 1, 100);
        match format.display_user_problem(&p, "carol", &problem).unwrap() {
            ProblemCell::Scored(cell) => {
                assert_eq!(cell.bonus.as_deref(), Some("+4"));
                assert!(cell.first_solve);
                assert_eq!(cell.time.as_deref(), Some("0:01:30"));
            }
            other => panic!("unexpected cell {:?}", other),
        }
    }
}
