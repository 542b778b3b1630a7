use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::GatewayIntent,
        use_cases::{
            ledger::{CreatorRepo, GatewayEventRepo, PaymentIntentRepo, PayoutRepo},
            settlement::SettlementUseCases,
        },
    },
    domain::entities::{
        payment_intent_status::PaymentIntentStatus, payout_status::PayoutAccountStatus,
    },
};

/// Gateway callback, already authenticated and decoded by the HTTP adapter.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    PaymentSucceeded(GatewayIntent),
    PaymentFailed {
        intent_id: String,
    },
    AccountUpdated {
        account_id: String,
        charges_enabled: bool,
        payouts_enabled: bool,
    },
    TransferCreated {
        transfer_id: String,
        payout_id: Option<Uuid>,
    },
    Unhandled,
}

pub struct ReconciliationUseCases {
    settlement: Arc<SettlementUseCases>,
    intent_repo: Arc<dyn PaymentIntentRepo>,
    creator_repo: Arc<dyn CreatorRepo>,
    payout_repo: Arc<dyn PayoutRepo>,
    event_repo: Arc<dyn GatewayEventRepo>,
}

impl ReconciliationUseCases {
    pub fn new(
        settlement: Arc<SettlementUseCases>,
        intent_repo: Arc<dyn PaymentIntentRepo>,
        creator_repo: Arc<dyn CreatorRepo>,
        payout_repo: Arc<dyn PayoutRepo>,
        event_repo: Arc<dyn GatewayEventRepo>,
    ) -> Self {
        Self {
            settlement,
            intent_repo,
            creator_repo,
            payout_repo,
            event_repo,
        }
    }

    pub async fn is_event_processed(&self, event_id: &str) -> AppResult<bool> {
        self.event_repo.is_processed(event_id).await
    }

    pub async fn record_event_processed(&self, event_id: &str, event_type: &str) -> AppResult<()> {
        self.event_repo.record_processed(event_id, event_type).await
    }

    #[instrument(skip(self))]
    pub async fn apply(&self, event: GatewayEvent) -> AppResult<()> {
        match event {
            GatewayEvent::PaymentSucceeded(remote) => self.payment_succeeded(&remote).await,
            GatewayEvent::PaymentFailed { intent_id } => self.payment_failed(&intent_id).await,
            GatewayEvent::AccountUpdated {
                account_id,
                charges_enabled,
                payouts_enabled,
            } => {
                let status = PayoutAccountStatus::from_capabilities(charges_enabled, payouts_enabled);
                if !self
                    .creator_repo
                    .update_payout_account_status(&account_id, status)
                    .await?
                {
                    return Err(AppError::NotFound(format!(
                        "No creator owns connected account {}",
                        account_id
                    )));
                }
                tracing::info!(account_id, ?status, "Payout account status updated");
                Ok(())
            }
            GatewayEvent::TransferCreated {
                transfer_id,
                payout_id,
            } => {
                if !self.payout_repo.mark_completed(&transfer_id, payout_id).await? {
                    return Err(AppError::NotFound(format!(
                        "No payout matches transfer {}",
                        transfer_id
                    )));
                }
                tracing::info!(transfer_id, "Payout completed");
                Ok(())
            }
            GatewayEvent::Unhandled => Ok(()),
        }
    }

    async fn payment_succeeded(&self, remote: &GatewayIntent) -> AppResult<()> {
        let intent = match self.intent_repo.get_by_id(&remote.id).await? {
            Some(intent) => intent,
            None => self.settlement.restore_intent(remote).await?,
        };
        self.intent_repo
            .update_status(&intent.id, PaymentIntentStatus::Succeeded)
            .await?;
        self.settlement.settle(&intent).await?;
        Ok(())
    }

    async fn payment_failed(&self, intent_id: &str) -> AppResult<()> {
        let stored = self
            .intent_repo
            .update_status(intent_id, PaymentIntentStatus::Failed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown payment intent {}", intent_id)))?;
        if stored == PaymentIntentStatus::Succeeded {
            tracing::info!(intent_id, "Ignoring failure event for a succeeded intent");
        }
        Ok(())
    }
}
