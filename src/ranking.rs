//! Ranking list builder
//!
//! Orders participations, assigns competition ranks and renders each row's
//! cells through the contest format. A cell whose stored format data cannot
//! be read degrades to [`ProblemCell::Unknown`]; it never fails the ranking.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::{
    context::ContestContext,
    formats::{ProblemCell, ResultCell},
    models::{ContestProblem, ParticipationKind, RankingRow},
};

/// What is shown in the rank column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankLabel {
    Position(u32),
    /// The viewer may not see the full scoreboard
    Hidden,
    /// The viewer's own virtual participation shown above a live ranking
    Current,
    Live,
    Virtual(i32),
}

impl fmt::Display for RankLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(n) => write!(f, "{}", n),
            Self::Hidden => write!(f, "???"),
            Self::Current => write!(f, "-"),
            Self::Live => write!(f, "Live"),
            Self::Virtual(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for RankLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How rank labels are assigned to a list of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankLabeling {
    /// Sort and rank
    Ranked,
    /// Sort, but hide the positions
    Hidden,
    /// Keep the given order and label rows by participation kind
    History,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub rank: RankLabel,
    pub participation_id: i64,
    pub user_id: i64,
    pub username: String,
    pub display_rank: String,
    pub score: f64,
    pub cumtime: i64,
    pub tiebreaker: f64,
    pub virtual_id: i32,
    pub is_disqualified: bool,
    pub problem_cells: Vec<ProblemCell>,
    pub result_cell: ResultCell,
}

/// Scoreboard column header for one problem
#[derive(Debug, Clone, Serialize)]
pub struct ProblemColumn {
    pub id: i64,
    pub label: String,
    pub code: String,
    pub name: String,
    pub points: i32,
}

/// Scoreboard order: non-disqualified first, then score desc, cumtime asc,
/// tiebreaker asc and finally more submissions first.
pub fn ranking_order(a: &RankingRow, b: &RankingRow) -> Ordering {
    let (pa, pb) = (&a.participation, &b.participation);
    pa.is_disqualified
        .cmp(&pb.is_disqualified)
        .then_with(|| pb.score.total_cmp(&pa.score))
        .then_with(|| pa.cumtime.cmp(&pb.cumtime))
        .then_with(|| pa.tiebreaker.total_cmp(&pb.tiebreaker))
        .then_with(|| b.submission_count.cmp(&a.submission_count))
}

/// Competition ranking ("1224") over an already sorted sequence.
///
/// Items with equal keys share a rank; the next distinct key is ranked one
/// past the number of items before it.
pub fn ranker<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<(u32, T)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut ranked = Vec::new();
    let mut last: Option<K> = None;
    let mut rank = 0;

    for (index, item) in items.into_iter().enumerate() {
        let current = key(&item);
        if last.as_ref() != Some(&current) {
            rank = index as u32 + 1;
        }
        last = Some(current);
        ranked.push((rank, item));
    }

    ranked
}

pub fn problem_columns(ctx: &ContestContext, problems: &[ContestProblem]) -> Vec<ProblemColumn> {
    problems
        .iter()
        .enumerate()
        .map(|(index, problem)| ProblemColumn {
            id: problem.id,
            label: ctx.problem_label(index),
            code: problem.problem_code.clone(),
            name: problem.problem_name.clone(),
            points: problem.points,
        })
        .collect()
}

/// Render one row with the contest format
pub fn make_entry(
    ctx: &ContestContext,
    problems: &[ContestProblem],
    row: RankingRow,
    rank: RankLabel,
) -> RankedEntry {
    let format = ctx.format();
    let participation = &row.participation;

    let problem_cells = problems
        .iter()
        .map(|problem| {
            format
                .display_user_problem(participation, &row.username, problem)
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        participation_id = participation.id,
                        contest_problem_id = problem.id,
                        error = %e,
                        "Unreadable format data, rendering unknown cell"
                    );
                    ProblemCell::Unknown
                })
        })
        .collect();
    let result_cell = format.display_participation_result(participation);

    RankedEntry {
        rank,
        participation_id: participation.id,
        user_id: participation.user_id,
        score: participation.score,
        cumtime: participation.cumtime,
        tiebreaker: participation.tiebreaker,
        virtual_id: participation.virtual_id,
        is_disqualified: participation.is_disqualified,
        problem_cells,
        result_cell,
        username: row.username,
        display_rank: row.display_rank,
    }
}

/// Build the ranked rows of a scoreboard
pub fn build_ranking(
    ctx: &ContestContext,
    problems: &[ContestProblem],
    mut rows: Vec<RankingRow>,
    labeling: RankLabeling,
) -> Vec<RankedEntry> {
    match labeling {
        RankLabeling::Ranked => {
            rows.sort_by(ranking_order);
            ranker(rows, |row| {
                let p = &row.participation;
                (p.is_disqualified, p.score, p.cumtime, p.tiebreaker)
            })
            .into_iter()
            .map(|(rank, row)| make_entry(ctx, problems, row, RankLabel::Position(rank)))
            .collect()
        }
        RankLabeling::Hidden => {
            rows.sort_by(ranking_order);
            rows.into_iter()
                .map(|row| make_entry(ctx, problems, row, RankLabel::Hidden))
                .collect()
        }
        RankLabeling::History => rows
            .into_iter()
            .map(|row| {
                let label = match row.participation.kind() {
                    ParticipationKind::Virtual(n) => RankLabel::Virtual(n),
                    _ => RankLabel::Live,
                };
                make_entry(ctx, problems, row, label)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FormatRegistry;
    use crate::test_utils::fixtures;

    fn ctx() -> ContestContext {
        let contest = fixtures::contest(1, "round1");
        let now = contest.end_time;
        ContestContext::new(contest, vec![], &FormatRegistry::builtin(), now).unwrap()
    }

    fn row(id: i64, score: f64, cumtime: i64) -> RankingRow {
        let mut p = fixtures::participation(id, 1, id, 0);
        p.score = score;
        p.cumtime = cumtime;
        fixtures::ranking_row(p, &format!("user{}", id))
    }

    #[test]
    fn test_ranker_competition_ranking() {
        let ranked = ranker(vec![100, 90, 90, 80, 80, 80, 10], |x| *x);
        let ranks: Vec<u32> = ranked.iter().map(|(r, _)| *r).collect();
        assert_eq!(ranks, vec![1, 2, 2, 4, 4, 4, 7]);
        assert!(ranker(Vec::<i32>::new(), |x| *x).is_empty());
    }

    #[test]
    fn test_sort_order() {
        let ctx = ctx();
        let mut dq = row(1, 500.0, 0);
        dq.participation.is_disqualified = true;
        let mut busy = row(4, 50.0, 100);
        busy.submission_count = 10;

        let rows = vec![dq, row(2, 50.0, 100), row(3, 50.0, 50), busy, row(5, 80.0, 900)];
        let entries = build_ranking(&ctx, &[], rows, RankLabeling::Ranked);

        let order: Vec<i64> = entries.iter().map(|e| e.participation_id).collect();
        assert_eq!(order, vec![5, 3, 4, 2, 1]);

        let ranks: Vec<RankLabel> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(
            ranks,
            vec![
                RankLabel::Position(1),
                RankLabel::Position(2),
                RankLabel::Position(3),
                RankLabel::Position(3),
                RankLabel::Position(5),
            ]
        );
    }

    #[test]
    fn test_disqualified_rank_last_even_with_equal_score() {
        let ctx = ctx();
        let mut dq = row(1, 0.0, 0);
        dq.participation.is_disqualified = true;

        let entries = build_ranking(&ctx, &[], vec![dq, row(2, 0.0, 0)], RankLabeling::Ranked);
        assert_eq!(entries[0].participation_id, 2);
        assert_eq!(entries[0].rank, RankLabel::Position(1));
        assert_eq!(entries[1].rank, RankLabel::Position(2));
    }

    #[test]
    fn test_stale_cell_is_isolated() {
        let ctx = ctx();
        let problems = vec![
            fixtures::contest_problem(1, 1, 100),
            fixtures::contest_problem(2, 1, 100),
        ];
        let mut stale = row(1, 100.0, 60);
        stale.participation.format_data = Some(serde_json::json!({
            "1": {"time": 60.0, "points": 100.0},
            "2": {"disqualified": true}
        }));

        let entries = build_ranking(&ctx, &problems, vec![stale], RankLabeling::Ranked);
        assert!(matches!(entries[0].problem_cells[0], ProblemCell::Scored(_)));
        assert_eq!(entries[0].problem_cells[1], ProblemCell::Unknown);
        assert_eq!(entries[0].result_cell.points, "100");
    }

    #[test]
    fn test_hidden_and_history_labels() {
        let ctx = ctx();
        let hidden = build_ranking(&ctx, &[], vec![row(1, 1.0, 0)], RankLabeling::Hidden);
        assert_eq!(hidden[0].rank.to_string(), "???");

        let mut v2 = row(1, 1.0, 0);
        v2.participation.virtual_id = 2;
        let history = build_ranking(&ctx, &[], vec![v2, row(1, 5.0, 0)], RankLabeling::History);
        assert_eq!(history[0].rank, RankLabel::Virtual(2));
        assert_eq!(history[1].rank, RankLabel::Live);
    }

    #[test]
    fn test_rank_label_serializes_as_string() {
        assert_eq!(serde_json::to_value(RankLabel::Position(3)).unwrap(), "3");
        assert_eq!(serde_json::to_value(RankLabel::Current).unwrap(), "-");
    }
}
