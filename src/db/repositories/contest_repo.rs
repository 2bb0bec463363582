//! Contest repository

use sqlx::{PgConnection, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{Contest, ContestProblem},
};

const CONTEST_PROBLEM_COLUMNS: &str = r#"
    cp.id, cp.contest_id, cp.problem_id, p.code AS problem_code, p.name AS problem_name,
    cp.points, cp.partial, cp.is_pretested, cp."order", cp.max_submissions
"#;

/// Repository for contest database operations
pub struct ContestRepository;

impl ContestRepository {
    /// Find contest by key
    pub async fn find_by_key(pool: &PgPool, key: &str) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(r#"SELECT * FROM contests WHERE key = $1"#)
            .bind(key)
            .fetch_optional(pool)
            .await?;

        Ok(contest)
    }

    /// Find contest by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(r#"SELECT * FROM contests WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(contest)
    }

    /// Profile ids of the contest's organizers
    pub async fn organizer_ids(pool: &PgPool, contest_id: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"SELECT profile_id FROM contest_organizers WHERE contest_id = $1"#,
        )
        .bind(contest_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Contest problems in display order
    pub async fn problems(pool: &PgPool, contest_id: i64) -> AppResult<Vec<ContestProblem>> {
        let sql = format!(
            r#"
            SELECT {CONTEST_PROBLEM_COLUMNS}
            FROM contest_problems cp
            JOIN problems p ON p.id = cp.problem_id
            WHERE cp.contest_id = $1
            ORDER BY cp."order", cp.id
            "#
        );

        let problems = sqlx::query_as::<_, ContestProblem>(&sql)
            .bind(contest_id)
            .fetch_all(pool)
            .await?;

        Ok(problems)
    }

    pub async fn find_problem(pool: &PgPool, id: i64) -> AppResult<Option<ContestProblem>> {
        let sql = format!(
            r#"
            SELECT {CONTEST_PROBLEM_COLUMNS}
            FROM contest_problems cp
            JOIN problems p ON p.id = cp.problem_id
            WHERE cp.id = $1
            "#
        );

        let problem = sqlx::query_as::<_, ContestProblem>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(problem)
    }

    /// Replace the contest format and its config
    pub async fn update_format(
        pool: &PgPool,
        contest_id: i64,
        format_name: &str,
        format_config: Option<&serde_json::Value>,
    ) -> AppResult<Contest> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            UPDATE contests
            SET format_name = $2, format_config = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(contest_id)
        .bind(format_name)
        .bind(format_config)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

        Ok(contest)
    }

    pub async fn set_locked(pool: &PgPool, contest_id: i64, locked: bool) -> AppResult<Contest> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            UPDATE contests SET is_locked = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(contest_id)
        .bind(locked)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

        Ok(contest)
    }

    /// Recount live participations
    pub async fn update_user_count(pool: &PgPool, contest_id: i64) -> AppResult<i32> {
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE contests
            SET user_count = (
                SELECT COUNT(*)::int FROM contest_participations
                WHERE contest_id = $1 AND virtual_id = 0
            )
            WHERE id = $1
            RETURNING user_count
            "#,
        )
        .bind(contest_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn is_banned(pool: &PgPool, contest_id: i64, profile_id: i64) -> AppResult<bool> {
        let banned = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contest_banned_users
                WHERE contest_id = $1 AND profile_id = $2
            )
            "#,
        )
        .bind(contest_id)
        .bind(profile_id)
        .fetch_one(pool)
        .await?;

        Ok(banned)
    }

    pub async fn ban(conn: &mut PgConnection, contest_id: i64, profile_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contest_banned_users (contest_id, profile_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(contest_id)
        .bind(profile_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn unban(conn: &mut PgConnection, contest_id: i64, profile_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"DELETE FROM contest_banned_users WHERE contest_id = $1 AND profile_id = $2"#,
        )
        .bind(contest_id)
        .bind(profile_id)
        .execute(conn)
        .await?;

        Ok(())
    }
}
