use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{SubscriptionProfile, SubscriptionRepo},
    domain::entities::subscription_status::SubscriptionStatus,
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> SubscriptionProfile {
    SubscriptionProfile {
        id: row.get("id"),
        subscriber_id: row.get("subscriber_id"),
        creator_id: row.get("creator_id"),
        amount_paid: row.get("amount_paid"),
        tier: row.get("tier"),
        status: row.get("status"),
        started_at: row.get("started_at"),
        expires_at: row.get("expires_at"),
        auto_renew: row.get("auto_renew"),
        payment_intent_id: row.get("payment_intent_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, subscriber_id, creator_id, amount_paid, tier, status, started_at,
    expires_at, auto_renew, payment_intent_id, created_at, updated_at
"#;

/// Flips lapsed active rows of the pair to `expired`.
pub(crate) async fn expire_lapsed(
    tx: &mut Transaction<'_, Postgres>,
    subscriber_id: Uuid,
    creator_id: Uuid,
    now: NaiveDateTime,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = $4, updated_at = NOW()
        WHERE subscriber_id = $1 AND creator_id = $2 AND status = $5 AND expires_at <= $3
        "#,
    )
    .bind(subscriber_id)
    .bind(creator_id)
    .bind(now)
    .bind(SubscriptionStatus::Expired)
    .bind(SubscriptionStatus::Active)
    .execute(&mut **tx)
    .await
    .map_err(AppError::from)?;
    Ok(())
}

pub(crate) async fn active_for(
    tx: &mut Transaction<'_, Postgres>,
    subscriber_id: Uuid,
    creator_id: Uuid,
) -> AppResult<Option<SubscriptionProfile>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM subscriptions WHERE subscriber_id = $1 AND creator_id = $2 AND status = $3",
        SELECT_COLS
    ))
    .bind(subscriber_id)
    .bind(creator_id)
    .bind(SubscriptionStatus::Active)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::from)?;
    Ok(row.as_ref().map(row_to_profile))
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query(&format!("SELECT {} FROM subscriptions WHERE id = $1", SELECT_COLS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn find_active(
        &self,
        subscriber_id: Uuid,
        creator_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Option<SubscriptionProfile>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        expire_lapsed(&mut tx, subscriber_id, creator_id, now).await?;
        let active = active_for(&mut tx, subscriber_id, creator_id).await?;
        tx.commit().await.map_err(AppError::from)?;
        Ok(active)
    }

    async fn cancel(&self, id: Uuid) -> AppResult<SubscriptionProfile> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions
            SET status = $2, auto_renew = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(SubscriptionStatus::Cancelled)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref()
            .map(row_to_profile)
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))
    }

    /// The partial unique index on active rows turns a racing second
    /// activation into a unique violation, reported as `Conflict`.
    async fn reactivate(&self, id: Uuid) -> AppResult<SubscriptionProfile> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions
            SET status = $2, auto_renew = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(SubscriptionStatus::Active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Already subscribed to this creator".into()),
            other => other,
        })?;
        row.as_ref()
            .map(row_to_profile)
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))
    }
}
