use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{PayoutProfile, PayoutRepo},
    domain::entities::payout_status::PayoutStatus,
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> PayoutProfile {
    PayoutProfile {
        id: row.get("id"),
        creator_id: row.get("creator_id"),
        amount: row.get("amount"),
        status: row.get("status"),
        transfer_id: row.get("transfer_id"),
        failure_reason: row.get("failure_reason"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str =
    "id, creator_id, amount, status, transfer_id, failure_reason, created_at, updated_at";

const COMMITTED_SQL: &str = r#"
    SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payouts
    WHERE creator_id = $1 AND status <> $2
"#;

#[async_trait]
impl PayoutRepo for PostgresPersistence {
    async fn committed_total(&self, creator_id: Uuid) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(COMMITTED_SQL)
            .bind(creator_id)
            .bind(PayoutStatus::Failed)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(total)
    }

    async fn latest(&self, creator_id: Uuid) -> AppResult<Option<PayoutProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payouts WHERE creator_id = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLS
        ))
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn open_payout(
        &self,
        creator_id: Uuid,
        minimum: i64,
    ) -> AppResult<Option<PayoutProfile>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Serializes concurrent payout requests for the same creator.
        let earnings: Option<i64> =
            sqlx::query_scalar("SELECT total_earnings FROM creators WHERE id = $1 FOR UPDATE")
                .bind(creator_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::from)?;
        let earnings = earnings.ok_or_else(|| AppError::NotFound("Creator not found".into()))?;

        // A payout whose transfer never got a confirmed id is retried under its own key.
        let unsent = sqlx::query(&format!(
            r#"
            SELECT {} FROM payouts
            WHERE creator_id = $1 AND status = $2 AND transfer_id IS NULL
            ORDER BY created_at
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(creator_id)
        .bind(PayoutStatus::Pending)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?;
        if let Some(row) = unsent {
            tx.commit().await.map_err(AppError::from)?;
            return Ok(Some(row_to_profile(&row)));
        }

        let committed: i64 = sqlx::query_scalar(COMMITTED_SQL)
            .bind(creator_id)
            .bind(PayoutStatus::Failed)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from)?;

        let pending = (earnings - committed).max(0);
        if pending < minimum {
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payouts (id, creator_id, amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(creator_id)
        .bind(pending)
        .bind(PayoutStatus::Pending)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(Some(row_to_profile(&row)))
    }

    async fn set_transfer(&self, payout_id: Uuid, transfer_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE payouts SET transfer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(payout_id)
        .bind(transfer_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Payout not found".into()));
        }
        Ok(())
    }

    async fn mark_failed(&self, payout_id: Uuid, reason: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET status = $2, failure_reason = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payout_id)
        .bind(PayoutStatus::Failed)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Payout not found".into()));
        }
        Ok(())
    }

    async fn mark_completed(
        &self,
        transfer_id: &str,
        payout_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET status = $3, transfer_id = COALESCE(transfer_id, $1), updated_at = NOW()
            WHERE id = COALESCE((SELECT id FROM payouts WHERE transfer_id = $1), $2)
            "#,
        )
        .bind(transfer_id)
        .bind(payout_id)
        .bind(PayoutStatus::Completed)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
