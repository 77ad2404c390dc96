// Append-only notification store, consumed fire-and-forget by the approval
// workflow and read back by the recipient.

use uuid::Uuid;

use crate::db::Db;
use crate::models::{Notification, NotificationKind};

pub async fn create(
    db: &Db,
    user_id: &str,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> sqlx::Result<Notification> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (id, user_id, title, message, kind)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(message)
    .bind(kind)
    .fetch_one(db)
    .await
}

pub async fn list_for_user(db: &Db, user_id: &str) -> sqlx::Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Marking read is the only mutation a notification sees.
pub async fn mark_read(db: &Db, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE notifications SET read = true WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
