use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{ConnectedAccountRequest, PaymentGatewayPort, TransferRequest},
        pricing::{self, MIN_PAYOUT_AMOUNT},
        use_cases::ledger::{CreatorProfile, CreatorRepo, LedgerRepo, PayoutRepo},
        validators::{is_valid_business_type, is_valid_country_code, is_valid_email},
    },
    domain::entities::payout_status::PayoutAccountStatus,
};

#[derive(Debug, Clone, Serialize)]
pub struct PayoutReceipt {
    pub payout_id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPayout {
    pub amount: i64,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSnapshot {
    pub total_earnings: i64,
    pub this_month: i64,
    pub pending_payout: i64,
    pub last_payout: Option<LastPayout>,
    pub next_payout_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct ConnectAccountInput {
    pub creator_id: Uuid,
    pub business_type: String,
    pub country: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccountLink {
    pub account_id: String,
    pub onboarding_url: String,
}

pub struct PayoutUseCases {
    creator_repo: Arc<dyn CreatorRepo>,
    payout_repo: Arc<dyn PayoutRepo>,
    ledger_repo: Arc<dyn LedgerRepo>,
    gateway: Arc<dyn PaymentGatewayPort>,
    currency: String,
    app_origin: Url,
}

impl PayoutUseCases {
    pub fn new(
        creator_repo: Arc<dyn CreatorRepo>,
        payout_repo: Arc<dyn PayoutRepo>,
        ledger_repo: Arc<dyn LedgerRepo>,
        gateway: Arc<dyn PaymentGatewayPort>,
        currency: String,
        app_origin: Url,
    ) -> Self {
        Self {
            creator_repo,
            payout_repo,
            ledger_repo,
            gateway,
            currency,
            app_origin,
        }
    }

    async fn get_creator(&self, creator_id: Uuid) -> AppResult<CreatorProfile> {
        self.creator_repo
            .get_by_id(creator_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))
    }

    async fn pending_balance(&self, creator: &CreatorProfile) -> AppResult<i64> {
        let committed = self.payout_repo.committed_total(creator.id).await?;
        Ok((creator.total_earnings - committed).max(0))
    }

    /// Transfers the whole pending balance to the creator's connected account.
    ///
    /// The payout row is written before the transfer so a crash in between
    /// leaves a visible `pending` record rather than an untracked transfer.
    /// Such a record, or one whose transfer outcome never came back, is
    /// retried under the same idempotency key on the next request.
    #[instrument(skip(self))]
    pub async fn request_payout(&self, creator_id: Uuid) -> AppResult<PayoutReceipt> {
        let creator = self.get_creator(creator_id).await?;

        let destination = creator
            .verified_payout_account()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Creator not onboarded".into()))?;

        // The balance check runs under the creator row lock.
        let payout = self
            .payout_repo
            .open_payout(creator.id, MIN_PAYOUT_AMOUNT)
            .await?
            .ok_or_else(|| AppError::Validation("Minimum payout amount is $50".into()))?;

        let transfer = self
            .gateway
            .create_transfer(&TransferRequest {
                amount: payout.amount,
                currency: self.currency.clone(),
                destination_account: destination,
                payout_id: payout.id,
                idempotency_key: format!("payout-{}", payout.id),
            })
            .await;

        match transfer {
            Ok(transfer) => {
                self.payout_repo.set_transfer(payout.id, &transfer.id).await?;
                tracing::info!(
                    payout_id = %payout.id,
                    transfer_id = %transfer.id,
                    amount = payout.amount,
                    "Payout transfer created"
                );
                Ok(PayoutReceipt {
                    payout_id: payout.id,
                    amount: payout.amount,
                })
            }
            Err(err @ AppError::GatewayOutcomeUnknown { .. }) => {
                // The transfer may exist; the balance stays held until a retry
                // or a transfer webhook settles it.
                tracing::warn!(
                    payout_id = %payout.id,
                    error = %err,
                    "Payout transfer outcome unknown, leaving payout pending"
                );
                Err(err.in_context("Payout failed"))
            }
            Err(err) => {
                if let Err(mark_err) = self.payout_repo.mark_failed(payout.id, &err.to_string()).await {
                    tracing::error!(
                        payout_id = %payout.id,
                        error = %mark_err,
                        "Failed to mark payout as failed"
                    );
                }
                Err(err.in_context("Payout failed"))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_creator_earnings(&self, creator_id: Uuid) -> AppResult<EarningsSnapshot> {
        let creator = self.get_creator(creator_id).await?;
        let now = Utc::now().naive_utc();
        let (month_start, month_end) = pricing::month_window(now);

        let this_month = self
            .ledger_repo
            .earnings_between(creator.id, month_start, month_end)
            .await?;
        let pending_payout = self.pending_balance(&creator).await?;
        let last_payout = self
            .payout_repo
            .latest(creator.id)
            .await?
            .map(|p| LastPayout {
                amount: p.amount,
                date: p.created_at,
            });

        Ok(EarningsSnapshot {
            total_earnings: creator.total_earnings,
            this_month,
            pending_payout,
            last_payout,
            next_payout_date: pricing::next_payout_date(now.date()),
        })
    }

    /// Creates (or reuses) the creator's connected account and returns a
    /// fresh onboarding link.
    #[instrument(skip(self))]
    pub async fn connect_creator_account(
        &self,
        input: ConnectAccountInput,
    ) -> AppResult<ConnectedAccountLink> {
        if !is_valid_email(&input.email) {
            return Err(AppError::Validation("Invalid email address".into()));
        }
        if !is_valid_country_code(&input.country) {
            return Err(AppError::Validation(
                "Country must be a two-letter code".into(),
            ));
        }
        if !is_valid_business_type(&input.business_type) {
            return Err(AppError::Validation("Invalid business type".into()));
        }

        let creator = self.get_creator(input.creator_id).await?;

        let account_id = match creator.payout_account_id {
            Some(existing) => existing,
            None => {
                let account = self
                    .gateway
                    .create_connected_account(&ConnectedAccountRequest {
                        creator_id: creator.id,
                        email: input.email.trim().to_string(),
                        country: input.country.to_ascii_uppercase(),
                        business_type: input.business_type.clone(),
                        phone: input.phone.clone().filter(|p| !p.trim().is_empty()),
                    })
                    .await
                    .map_err(|e| e.in_context("Failed to create connected account"))?;
                self.creator_repo
                    .set_payout_account(creator.id, &account.id, PayoutAccountStatus::Pending)
                    .await?;
                tracing::info!(account_id = %account.id, "Connected account created");
                account.id
            }
        };

        let refresh_url = self.onboarding_url("refresh")?;
        let return_url = self.onboarding_url("complete")?;
        let link = self
            .gateway
            .create_account_link(&account_id, &refresh_url, &return_url)
            .await
            .map_err(|e| e.in_context("Failed to create onboarding link"))?;

        Ok(ConnectedAccountLink {
            account_id,
            onboarding_url: link.url,
        })
    }

    fn onboarding_url(&self, state: &str) -> AppResult<String> {
        let mut url = self
            .app_origin
            .join("/creator/payouts")
            .map_err(|e| AppError::Internal(format!("Invalid app origin: {}", e)))?;
        url.query_pairs_mut().append_pair("onboarding", state);
        Ok(url.to_string())
    }
}
