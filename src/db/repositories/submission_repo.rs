//! Submission repository

use std::collections::{BTreeMap, BTreeSet};

use sqlx::{FromRow, PgPool};

use crate::{
    constants::{CONTEST_POINTS_PRECISION, results},
    error::AppResult,
    models::{AttemptedProblem, ContestSubmission, ContestSubmissionScore, Submission},
};

const CONTEST_SUBMISSION_SELECT: &str = r#"
    SELECT cs.id, cs.submission_id, cs.problem_id, cs.participation_id, cs.points,
        cs.is_pretest, cs.bonus, cs.updated_frozen, cs.is_disqualified,
        s.date, cp.points AS problem_points
    FROM contest_submissions cs
    JOIN submissions s ON s.id = cs.submission_id
    JOIN contest_problems cp ON cp.id = cs.problem_id
"#;

#[derive(FromRow)]
struct AttemptedRow {
    problem_id: i64,
    achieved_points: f64,
    max_points: f64,
}

fn attempted_map(rows: Vec<AttemptedRow>) -> BTreeMap<i64, AttemptedProblem> {
    rows.into_iter()
        .map(|row| {
            (
                row.problem_id,
                AttemptedProblem {
                    achieved_points: row.achieved_points,
                    max_points: row.max_points,
                },
            )
        })
        .collect()
}

/// Repository for submission database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(submission)
    }

    pub async fn find_contest_submission(
        pool: &PgPool,
        submission_id: i64,
    ) -> AppResult<Option<ContestSubmission>> {
        let sql = format!("{CONTEST_SUBMISSION_SELECT} WHERE cs.submission_id = $1");
        let submission = sqlx::query_as::<_, ContestSubmission>(&sql)
            .bind(submission_id)
            .fetch_optional(pool)
            .await?;

        Ok(submission)
    }

    /// Every contest submission of a participation, oldest first
    pub async fn for_participation(
        pool: &PgPool,
        participation_id: i64,
    ) -> AppResult<Vec<ContestSubmission>> {
        let sql = format!(
            "{CONTEST_SUBMISSION_SELECT} WHERE cs.participation_id = $1 ORDER BY s.date, cs.id"
        );
        let submissions = sqlx::query_as::<_, ContestSubmission>(&sql)
            .bind(participation_id)
            .fetch_all(pool)
            .await?;

        Ok(submissions)
    }

    pub async fn frozen_for_contest(pool: &PgPool, contest_id: i64) -> AppResult<Vec<ContestSubmission>> {
        let sql = format!(
            r#"
            {CONTEST_SUBMISSION_SELECT}
            WHERE cp.contest_id = $1 AND cs.updated_frozen
            ORDER BY s.date, cs.id
            "#
        );
        let submissions = sqlx::query_as::<_, ContestSubmission>(&sql)
            .bind(contest_id)
            .fetch_all(pool)
            .await?;

        Ok(submissions)
    }

    pub async fn update_score(pool: &PgPool, id: i64, score: &ContestSubmissionScore) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE contest_submissions
            SET points = $2, bonus = $3, is_pretest = $4, updated_frozen = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(score.points)
        .bind(score.bonus)
        .bind(score.is_pretest)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn mark_frozen(pool: &PgPool, id: i64) -> AppResult<()> {
        sqlx::query(r#"UPDATE contest_submissions SET updated_frozen = TRUE WHERE id = $1"#)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn user_completed_ids(pool: &PgPool, profile_id: i64) -> AppResult<BTreeSet<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT s.problem_id
            FROM submissions s
            JOIN problems p ON p.id = s.problem_id
            WHERE s.user_id = $1 AND s.result = $2 AND s.total > 0 AND s.points >= s.total
            "#,
        )
        .bind(profile_id)
        .bind(results::ACCEPTED)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    pub async fn user_attempted(
        pool: &PgPool,
        profile_id: i64,
    ) -> AppResult<BTreeMap<i64, AttemptedProblem>> {
        let rows = sqlx::query_as::<_, AttemptedRow>(
            r#"
            SELECT problem_id, MAX(scaled) AS achieved_points, max_points
            FROM (
                SELECT s.problem_id, p.points AS max_points,
                    CASE WHEN s.total > 0
                        THEN ROUND((s.points / s.total * p.points)::numeric, $2)::float8
                        ELSE 0
                    END AS scaled
                FROM submissions s
                JOIN problems p ON p.id = s.problem_id
                WHERE s.user_id = $1 AND s.points IS NOT NULL
            ) judged
            GROUP BY problem_id, max_points
            HAVING MAX(scaled) < max_points
            "#,
        )
        .bind(profile_id)
        .bind(CONTEST_POINTS_PRECISION)
        .fetch_all(pool)
        .await?;

        Ok(attempted_map(rows))
    }

    /// Problem ids (not contest problem ids) fully solved in a participation
    pub async fn participation_completed_ids(
        pool: &PgPool,
        participation_id: i64,
    ) -> AppResult<BTreeSet<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT cp.problem_id
            FROM contest_submissions cs
            JOIN submissions s ON s.id = cs.submission_id
            JOIN contest_problems cp ON cp.id = cs.problem_id
            WHERE cs.participation_id = $1 AND s.result = $2 AND cs.points = cp.points
            "#,
        )
        .bind(participation_id)
        .bind(results::ACCEPTED)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    pub async fn participation_attempted(
        pool: &PgPool,
        participation_id: i64,
    ) -> AppResult<BTreeMap<i64, AttemptedProblem>> {
        let rows = sqlx::query_as::<_, AttemptedRow>(
            r#"
            SELECT cp.problem_id, MAX(cs.points) AS achieved_points,
                cp.points::float8 AS max_points
            FROM contest_submissions cs
            JOIN contest_problems cp ON cp.id = cs.problem_id
            WHERE cs.participation_id = $1
            GROUP BY cp.problem_id, cp.points
            HAVING MAX(cs.points) < cp.points
            "#,
        )
        .bind(participation_id)
        .fetch_all(pool)
        .await?;

        Ok(attempted_map(rows))
    }
}
