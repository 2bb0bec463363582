//! Profile repository

use sqlx::{PgConnection, PgPool};

use crate::{error::AppResult, models::Profile};

const PROFILE_COLUMNS: &str = "id, username, display_rank, is_unlisted, current_contest";

/// Repository for profile database operations
pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    pub async fn set_current_contest(
        pool: &PgPool,
        profile_id: i64,
        participation_id: Option<i64>,
    ) -> AppResult<()> {
        sqlx::query(r#"UPDATE profiles SET current_contest = $2 WHERE id = $1"#)
            .bind(profile_id)
            .bind(participation_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Clear the current contest only if it still points at `participation_id`
    pub async fn clear_current_contest(
        conn: &mut PgConnection,
        profile_id: i64,
        participation_id: i64,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE profiles SET current_contest = NULL
            WHERE id = $1 AND current_contest = $2
            "#,
        )
        .bind(profile_id)
        .bind(participation_id)
        .execute(conn)
        .await?;

        Ok(())
    }
}
