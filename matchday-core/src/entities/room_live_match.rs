use crate::entities::{db_timestamp, unix_millis};
use crate::framework::{DatabaseAccessor, DatabaseProcessor};
use kanau::processor::Processor;
use matchday_sdk::objects::{Fixture, LiveMatchResponse, MatchStatus};
use sqlx::types::Json;
use uuid::Uuid;

/// A chat room's association with one match snapshot.
///
/// At most one row per room has `is_active = true`; the partial unique
/// index `room_live_matches_one_active` enforces it in storage.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RoomLiveMatch {
    pub id: i64,
    pub room_id: Uuid,
    pub match_id: i64,
    pub match_data: Json<Fixture>,
    pub is_active: bool,
    pub activated_by: Option<Uuid>,
    pub update_interval_minutes: Option<i32>,
    pub updated_at: time::OffsetDateTime,
}

impl RoomLiveMatch {
    pub fn fixture(&self) -> &Fixture {
        &self.match_data.0
    }

    pub fn status(&self) -> MatchStatus {
        self.match_data.0.status
    }
}

impl From<&RoomLiveMatch> for LiveMatchResponse {
    fn from(row: &RoomLiveMatch) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            match_id: row.match_id,
            match_data: row.match_data.0.clone(),
            is_active: row.is_active,
            activated_by: row.activated_by,
            update_interval_minutes: row.update_interval_minutes,
            updated_at: unix_millis(row.updated_at),
        }
    }
}

#[derive(Debug, Clone)]
/// Get the active association of a room, if any.
pub struct GetActiveLiveMatch {
    pub room_id: Uuid,
}

impl Processor<GetActiveLiveMatch> for DatabaseProcessor {
    type Output = Option<RoomLiveMatch>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetActiveLiveMatch")]
    async fn process(&self, query: GetActiveLiveMatch) -> Result<Option<RoomLiveMatch>, sqlx::Error> {
        sqlx::query_as::<_, RoomLiveMatch>(
            r#"
            SELECT id, room_id, match_id, match_data, is_active, activated_by,
                   update_interval_minutes, updated_at
            FROM room_live_matches
            WHERE room_id = $1 AND is_active
            "#,
        )
        .bind(query.room_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Get one association by id, active or not.
pub struct GetLiveMatchById {
    pub id: i64,
}

impl Processor<GetLiveMatchById> for DatabaseProcessor {
    type Output = Option<RoomLiveMatch>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLiveMatchById")]
    async fn process(&self, query: GetLiveMatchById) -> Result<Option<RoomLiveMatch>, sqlx::Error> {
        sqlx::query_as::<_, RoomLiveMatch>(
            r#"
            SELECT id, room_id, match_id, match_data, is_active, activated_by,
                   update_interval_minutes, updated_at
            FROM room_live_matches
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Make `fixture` the room's active match.
///
/// Runs in one transaction holding a per-room advisory lock: every active
/// row of the room is deactivated, then the new row is inserted. Two
/// concurrent activations for the same room serialize on the lock, so the
/// room ends with exactly one active row.
pub struct ActivateLiveMatch {
    pub room_id: Uuid,
    pub fixture: Fixture,
    pub activated_by: Option<Uuid>,
    pub update_interval_minutes: Option<i32>,
}

impl Processor<ActivateLiveMatch> for DatabaseProcessor {
    type Output = RoomLiveMatch;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ActivateLiveMatch")]
    async fn process(&self, cmd: ActivateLiveMatch) -> Result<RoomLiveMatch, sqlx::Error> {
        let mut tx = self.begin().await?;
        let now = db_timestamp(time::OffsetDateTime::now_utc());

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(cmd.room_id)
            .execute(tx.acquire())
            .await?;

        sqlx::query(
            r#"
            UPDATE room_live_matches
            SET is_active = FALSE, updated_at = $2
            WHERE room_id = $1 AND is_active
            "#,
        )
        .bind(cmd.room_id)
        .bind(now)
        .execute(tx.acquire())
        .await?;

        let row = sqlx::query_as::<_, RoomLiveMatch>(
            r#"
            INSERT INTO room_live_matches
                (room_id, match_id, match_data, is_active, activated_by, update_interval_minutes, updated_at)
            VALUES ($1, $2, $3, TRUE, $4, $5, $6)
            RETURNING id, room_id, match_id, match_data, is_active, activated_by,
                      update_interval_minutes, updated_at
            "#,
        )
        .bind(cmd.room_id)
        .bind(cmd.fixture.id)
        .bind(Json(&cmd.fixture))
        .bind(cmd.activated_by)
        .bind(cmd.update_interval_minutes)
        .bind(now)
        .fetch_one(tx.acquire())
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}

#[derive(Debug, Clone)]
/// Deactivate the room's active association. Returns the number of rows
/// changed (0 or 1).
pub struct DeactivateLiveMatch {
    pub room_id: Uuid,
}

impl Processor<DeactivateLiveMatch> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeactivateLiveMatch")]
    async fn process(&self, cmd: DeactivateLiveMatch) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE room_live_matches
            SET is_active = FALSE, updated_at = $2
            WHERE room_id = $1 AND is_active
            "#,
        )
        .bind(cmd.room_id)
        .bind(db_timestamp(time::OffsetDateTime::now_utc()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Delete every association of a room, active or not.
pub struct DeleteLiveMatch {
    pub room_id: Uuid,
}

impl Processor<DeleteLiveMatch> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteLiveMatch")]
    async fn process(&self, cmd: DeleteLiveMatch) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM room_live_matches WHERE room_id = $1")
            .bind(cmd.room_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Write a polled snapshot back to the room's active row for that match.
///
/// Only the row that is still active and still tracks `match_id` is
/// touched; returns whether it was found.
pub struct SaveLiveMatchSnapshot {
    pub room_id: Uuid,
    pub match_id: i64,
    pub fixture: Fixture,
    pub updated_at: time::OffsetDateTime,
}

impl Processor<SaveLiveMatchSnapshot> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SaveLiveMatchSnapshot")]
    async fn process(&self, cmd: SaveLiveMatchSnapshot) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE room_live_matches
            SET match_data = $3, updated_at = $4
            WHERE room_id = $1 AND match_id = $2 AND is_active
            "#,
        )
        .bind(cmd.room_id)
        .bind(cmd.match_id)
        .bind(Json(&cmd.fixture))
        .bind(cmd.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_keeps_millisecond_precision() {
        let fixture: Fixture = serde_json::from_str(
            r#"{
                "id": 100,
                "home_team": "Al Ahly",
                "away_team": "Zamalek",
                "home_score": 1,
                "away_score": 0,
                "status": "live",
                "minute": 55,
                "league": "Egyptian Premier League"
            }"#,
        )
        .unwrap();
        let row = RoomLiveMatch {
            id: 7,
            room_id: Uuid::new_v4(),
            match_id: 100,
            match_data: Json(fixture),
            is_active: true,
            activated_by: None,
            update_interval_minutes: Some(3),
            updated_at: time::macros::datetime!(2024-05-01 10:00:00.123456 UTC),
        };
        assert_eq!(row.status(), MatchStatus::Live);
        assert_eq!(row.fixture().home_score, Some(1));

        let wire = LiveMatchResponse::from(&row);
        assert_eq!(wire.updated_at, 1_714_557_600_123);
        assert_eq!(wire.match_data.minute, Some(55));
        assert_eq!(wire.update_interval_minutes, Some(3));
    }
}
