//! Contest participation repository

use sqlx::{PgConnection, PgPool};

use crate::{
    constants::DISQUALIFIED_SCORE,
    db::store::ParticipationFilter,
    error::{AppError, AppResult},
    models::{ContestParticipation, NewParticipation, ParticipationResults, RankingRow},
};

/// Repository for participation database operations
pub struct ParticipationRepository;

impl ParticipationRepository {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> AppResult<Option<ContestParticipation>> {
        let participation = sqlx::query_as::<_, ContestParticipation>(
            r#"SELECT * FROM contest_participations WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(participation)
    }

    pub async fn find(
        pool: &PgPool,
        contest_id: i64,
        user_id: i64,
        virtual_id: i32,
    ) -> AppResult<Option<ContestParticipation>> {
        let participation = sqlx::query_as::<_, ContestParticipation>(
            r#"
            SELECT * FROM contest_participations
            WHERE contest_id = $1 AND user_id = $2 AND virtual_id = $3
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .bind(virtual_id)
        .fetch_optional(pool)
        .await?;

        Ok(participation)
    }

    pub async fn max_virtual_id(pool: &PgPool, contest_id: i64, user_id: i64) -> AppResult<i32> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MAX(virtual_id) FROM contest_participations
            WHERE contest_id = $1 AND user_id = $2
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(max.unwrap_or(0).max(0))
    }

    /// Insert a participation; unique violations surface as `DataIntegrity`
    pub async fn create(pool: &PgPool, new: &NewParticipation) -> AppResult<ContestParticipation> {
        let participation = sqlx::query_as::<_, ContestParticipation>(
            r#"
            INSERT INTO contest_participations (contest_id, user_id, virtual_id, real_start)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.contest_id)
        .bind(new.user_id)
        .bind(new.virtual_id)
        .bind(new.real_start)
        .fetch_one(pool)
        .await?;

        Ok(participation)
    }

    pub async fn ids_for_contest(pool: &PgPool, contest_id: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"SELECT id FROM contest_participations WHERE contest_id = $1 ORDER BY id"#,
        )
        .bind(contest_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Participations with the profile fields a scoreboard shows
    pub async fn ranking_rows(
        pool: &PgPool,
        contest_id: i64,
        filter: ParticipationFilter,
    ) -> AppResult<Vec<RankingRow>> {
        let (condition, order, profile_id) = match filter {
            ParticipationFilter::Live => (
                "cp.virtual_id = 0 AND NOT pr.is_unlisted",
                "cp.is_disqualified, cp.score DESC, cp.cumtime, cp.tiebreaker",
                None,
            ),
            ParticipationFilter::UserLive(id) => (
                "cp.virtual_id = 0 AND cp.user_id = $2",
                "cp.id",
                Some(id),
            ),
            ParticipationFilter::UserHistory(id) => (
                "cp.virtual_id >= 0 AND cp.user_id = $2",
                "cp.virtual_id DESC",
                Some(id),
            ),
        };

        let sql = format!(
            r#"
            SELECT cp.*, pr.username, pr.display_rank,
                (SELECT COUNT(*) FROM contest_submissions cs
                 WHERE cs.participation_id = cp.id) AS submission_count
            FROM contest_participations cp
            JOIN profiles pr ON pr.id = cp.user_id
            WHERE cp.contest_id = $1 AND {condition}
            ORDER BY {order}
            "#
        );

        let mut query = sqlx::query_as::<_, RankingRow>(&sql).bind(contest_id);
        if let Some(id) = profile_id {
            query = query.bind(id);
        }

        Ok(query.fetch_all(pool).await?)
    }

    /// Write computed results, forcing the sentinel score when disqualified
    pub async fn save_results(
        conn: &mut PgConnection,
        id: i64,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation> {
        let participation = sqlx::query_as::<_, ContestParticipation>(
            r#"
            UPDATE contest_participations
            SET score = CASE WHEN is_disqualified THEN $6 ELSE $2 END,
                cumtime = $3,
                tiebreaker = $4,
                format_data = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(results.score)
        .bind(results.cumtime)
        .bind(results.tiebreaker)
        .bind(&results.format_data)
        .bind(DISQUALIFIED_SCORE)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Participation not found".to_string()))?;

        Ok(participation)
    }

    pub async fn set_disqualified(conn: &mut PgConnection, id: i64, disqualified: bool) -> AppResult<()> {
        sqlx::query(r#"UPDATE contest_participations SET is_disqualified = $2 WHERE id = $1"#)
            .bind(id)
            .bind(disqualified)
            .execute(conn)
            .await?;

        Ok(())
    }
}
