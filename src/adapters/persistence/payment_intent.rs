use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{NewPaymentIntent, PaymentIntentProfile, PaymentIntentRepo},
    domain::entities::{payment_intent_status::PaymentIntentStatus, subscription_tier::SubscriptionTier},
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> PaymentIntentProfile {
    PaymentIntentProfile {
        id: row.get("id"),
        payer_id: row.get("payer_id"),
        creator_id: row.get("creator_id"),
        amount: row.get("amount"),
        platform_fee: row.get("platform_fee"),
        kind: row.get("kind"),
        status: row.get("status"),
        content_id: row.get("content_id"),
        subscription_tier: row.get::<Option<SubscriptionTier>, _>("subscription_tier"),
        tip_message: row.get("tip_message"),
        idempotency_key: row.get("idempotency_key"),
        settled_at: row.get("settled_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, payer_id, creator_id, amount, platform_fee, kind, status, content_id,
    subscription_tier, tip_message, idempotency_key, settled_at, created_at, updated_at
"#;

#[async_trait]
impl PaymentIntentRepo for PostgresPersistence {
    async fn insert(&self, intent: &NewPaymentIntent) -> AppResult<PaymentIntentProfile> {
        sqlx::query(
            r#"
            INSERT INTO payment_intents
                (id, payer_id, creator_id, amount, platform_fee, kind, content_id,
                 subscription_tier, tip_message, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&intent.id)
        .bind(intent.payer_id)
        .bind(intent.creator_id)
        .bind(intent.amount)
        .bind(intent.platform_fee)
        .bind(intent.kind)
        .bind(intent.content_id)
        .bind(intent.subscription_tier)
        .bind(&intent.tip_message)
        .bind(&intent.idempotency_key)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        self.get_by_id(&intent.id)
            .await?
            .ok_or_else(|| AppError::Internal("Inserted payment intent vanished".into()))
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<PaymentIntentProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payment_intents WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn update_status(
        &self,
        id: &str,
        status: PaymentIntentStatus,
    ) -> AppResult<Option<PaymentIntentStatus>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let current: Option<PaymentIntentStatus> =
            sqlx::query_scalar("SELECT status FROM payment_intents WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::from)?;
        let Some(current) = current else {
            return Ok(None);
        };

        let next = current.transition(status);
        if next != current {
            sqlx::query("UPDATE payment_intents SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(next)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(Some(next))
    }
}
