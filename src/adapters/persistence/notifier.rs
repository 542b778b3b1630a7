use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::notifications::Notifier,
};

/// Messages and notifications are plain rows read by the client apps.
#[async_trait]
impl Notifier for PostgresPersistence {
    async fn send_message(&self, sender_id: Uuid, recipient_id: Uuid, body: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO messages (sender_id, recipient_id, body) VALUES ($1, $2, $3)")
            .bind(sender_id)
            .bind(recipient_id)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn notify(&self, user_id: Uuid, kind: &str, title: &str, body: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (user_id, kind, title, body) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
