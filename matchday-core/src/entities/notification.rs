use crate::entities::unix_millis;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use matchday_sdk::objects::{NotificationResponse, NotificationType};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: time::OffsetDateTime,
}

impl Notification {
    pub fn kind(&self) -> NotificationType {
        serde_json::from_value(serde_json::Value::String(self.notification_type.clone()))
            .unwrap_or(NotificationType::Other)
    }
}

impl From<Notification> for NotificationResponse {
    fn from(row: Notification) -> Self {
        let kind = row.kind();
        Self {
            id: row.id,
            user_id: row.user_id,
            notification_type: kind,
            title: row.title,
            message: row.message,
            data: row.data,
            // chat_room rows always present as read
            is_read: kind.effective_is_read(row.is_read),
            created_at: unix_millis(row.created_at),
        }
    }
}

#[derive(Debug, Clone)]
/// List a user's notifications, newest first.
pub struct ListNotifications {
    pub user_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListNotifications> for DatabaseProcessor {
    type Output = Vec<Notification>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListNotifications")]
    async fn process(&self, query: ListNotifications) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, title, message, data, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.user_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetNotificationById {
    pub id: Uuid,
}

impl Processor<GetNotificationById> for DatabaseProcessor {
    type Output = Option<Notification>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetNotificationById")]
    async fn process(&self, query: GetNotificationById) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, title, message, data, is_read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Mark one notification read. Returns the updated row, or `None` if it
/// does not exist.
pub struct MarkNotificationRead {
    pub id: Uuid,
}

impl Processor<MarkNotificationRead> for DatabaseProcessor {
    type Output = Option<Notification>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkNotificationRead")]
    async fn process(&self, cmd: MarkNotificationRead) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1
            RETURNING id, user_id, type, title, message, data, is_read, created_at
            "#,
        )
        .bind(cmd.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Mark all of a user's unread notifications read.
pub struct MarkAllNotificationsRead {
    pub user_id: Uuid,
}

impl Processor<MarkAllNotificationsRead> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkAllNotificationsRead")]
    async fn process(&self, cmd: MarkAllNotificationsRead) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(cmd.user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Count unread notifications. `chat_room` rows never count.
pub struct CountUnreadNotifications {
    pub user_id: Uuid,
}

impl Processor<CountUnreadNotifications> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CountUnreadNotifications")]
    async fn process(&self, query: CountUnreadNotifications) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND NOT is_read AND type <> 'chat_room'
            "#,
        )
        .bind(query.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
