use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{ContentItem, ContentRepo, ContentSource},
};

#[async_trait]
impl ContentRepo for PostgresPersistence {
    /// Priced content is either a post or a direct message.
    async fn get_by_id(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, creator_id, TRUE AS is_post, is_ppv, price FROM posts WHERE id = $1
            UNION ALL
            SELECT id, sender_id AS creator_id, FALSE AS is_post, is_ppv, price FROM messages WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(|row| ContentItem {
            id: row.get("id"),
            creator_id: row.get("creator_id"),
            source: if row.get::<bool, _>("is_post") {
                ContentSource::Post
            } else {
                ContentSource::Message
            },
            is_ppv: row.get("is_ppv"),
            price: row.get("price"),
        }))
    }
}
