use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
    adapters::persistence::{
        PostgresPersistence,
        subscription::{active_for, expire_lapsed},
    },
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{LedgerRepo, Settlement, SettlementInput},
    domain::entities::{purchase_kind::PurchaseKind, subscription_status::SubscriptionStatus},
};

fn already_subscribed() -> AppError {
    AppError::Conflict("Already subscribed to this creator".into())
}

#[async_trait]
impl LedgerRepo for PostgresPersistence {
    /// Dropping the transaction on any early return rolls the claim back.
    async fn settle(&self, input: &SettlementInput) -> AppResult<Settlement> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let claimed = sqlx::query(
            r#"
            UPDATE payment_intents
            SET settled_at = $2, updated_at = NOW()
            WHERE id = $1 AND settled_at IS NULL
            "#,
        )
        .bind(&input.payment_intent_id)
        .bind(input.settled_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?
        .rows_affected();
        if claimed == 0 {
            return Ok(Settlement::AlreadySettled);
        }

        let credited = match input.kind {
            PurchaseKind::Subscription => {
                expire_lapsed(&mut tx, input.payer_id, input.creator_id, input.settled_at).await?;
                if active_for(&mut tx, input.payer_id, input.creator_id)
                    .await?
                    .is_some()
                {
                    return Err(already_subscribed());
                }
                sqlx::query(
                    r#"
                    INSERT INTO subscriptions
                        (subscriber_id, creator_id, amount_paid, tier, status, started_at,
                         expires_at, auto_renew, payment_intent_id)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
                    "#,
                )
                .bind(input.payer_id)
                .bind(input.creator_id)
                .bind(input.amount)
                .bind(input.subscription_tier)
                .bind(SubscriptionStatus::Active)
                .bind(input.settled_at)
                .bind(input.expires_at)
                .bind(&input.payment_intent_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| match AppError::from(e) {
                    AppError::Conflict(_) => already_subscribed(),
                    other => other,
                })?;
                true
            }
            PurchaseKind::Tip => {
                sqlx::query(
                    r#"
                    INSERT INTO tips (tipper_id, creator_id, amount, message, payment_intent_id, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(input.payer_id)
                .bind(input.creator_id)
                .bind(input.amount)
                .bind(&input.tip_message)
                .bind(&input.payment_intent_id)
                .bind(input.settled_at)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
                true
            }
            PurchaseKind::Ppv => {
                let content_id = input
                    .content_id
                    .ok_or_else(|| AppError::Validation("contentId is required".into()))?;
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO ppv_purchases
                        (buyer_id, content_id, creator_id, amount, payment_intent_id, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (buyer_id, content_id) DO NOTHING
                    "#,
                )
                .bind(input.payer_id)
                .bind(content_id)
                .bind(input.creator_id)
                .bind(input.amount)
                .bind(&input.payment_intent_id)
                .bind(input.settled_at)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?
                .rows_affected();
                inserted == 1
            }
            // The settled intent itself is the record.
            PurchaseKind::LiveStream => true,
        };

        if credited {
            let new_subscribers: i64 = i64::from(input.kind == PurchaseKind::Subscription);
            let updated = sqlx::query(
                r#"
                UPDATE creators
                SET total_earnings = total_earnings + $2,
                    total_subscribers = total_subscribers + $3,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(input.creator_id)
            .bind(input.amount)
            .bind(new_subscribers)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?
            .rows_affected();
            if updated == 0 {
                return Err(AppError::NotFound("Creator not found".into()));
            }
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(if credited {
            Settlement::Applied
        } else {
            Settlement::AlreadyOwned
        })
    }

    async fn has_ppv_purchase(&self, buyer_id: Uuid, content_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ppv_purchases WHERE buyer_id = $1 AND content_id = $2)",
        )
        .bind(buyer_id)
        .bind(content_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(exists)
    }

    async fn earnings_between(
        &self,
        creator_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COALESCE(SUM(amount_paid), 0) FROM subscriptions
                 WHERE creator_id = $1 AND created_at >= $2 AND created_at < $3)::BIGINT
              + (SELECT COALESCE(SUM(amount), 0) FROM tips
                 WHERE creator_id = $1 AND created_at >= $2 AND created_at < $3)::BIGINT
            "#,
        )
        .bind(creator_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(total)
    }
}
