use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{CreatorProfile, CreatorRepo},
    domain::entities::payout_status::PayoutAccountStatus,
};

pub(crate) fn row_to_profile(row: &sqlx::postgres::PgRow) -> CreatorProfile {
    CreatorProfile {
        id: row.get("id"),
        display_name: row.get("display_name"),
        welcome_message: row.get("welcome_message"),
        total_earnings: row.get("total_earnings"),
        total_subscribers: row.get("total_subscribers"),
        total_posts: row.get("total_posts"),
        payout_account_id: row.get("payout_account_id"),
        payout_account_status: row.get::<Option<PayoutAccountStatus>, _>("payout_account_status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) const SELECT_COLS: &str = r#"
    id, display_name, welcome_message, total_earnings, total_subscribers,
    total_posts, payout_account_id, payout_account_status, created_at, updated_at
"#;

#[async_trait]
impl CreatorRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<CreatorProfile>> {
        let row = sqlx::query(&format!("SELECT {} FROM creators WHERE id = $1", SELECT_COLS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn set_payout_account(
        &self,
        creator_id: Uuid,
        account_id: &str,
        status: PayoutAccountStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE creators
            SET payout_account_id = $2, payout_account_status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(creator_id)
        .bind(account_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Creator not found".into()));
        }
        Ok(())
    }

    async fn update_payout_account_status(
        &self,
        account_id: &str,
        status: PayoutAccountStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE creators
            SET payout_account_status = $2, updated_at = NOW()
            WHERE payout_account_id = $1
            "#,
        )
        .bind(account_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
