use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{
            CreateIntentRequest, GatewayIntent, GatewayIntentStatus, IntentMetadata,
            PaymentGatewayPort,
        },
        pricing,
        use_cases::{
            ledger::{
                ContentItem, ContentRepo, CreatorRepo, LedgerRepo, NewPaymentIntent,
                PaymentIntentProfile, PaymentIntentRepo, Settlement, SettlementInput,
                SubscriptionRepo,
            },
            notifications::{Notifier, SideEffect, spawn_side_effects},
        },
        validators::is_valid_tip_message,
    },
    domain::entities::{
        payment_intent_status::PaymentIntentStatus, purchase_kind::PurchaseKind,
        subscription_tier::SubscriptionTier,
    },
};

const CREATE_FAILED: &str = "Failed to create payment intent";
const CONFIRM_FAILED: &str = "Failed to confirm payment";

#[derive(Debug, Clone)]
pub struct CreateIntentInput {
    pub kind: PurchaseKind,
    pub amount: i64,
    pub creator_id: Uuid,
    pub payer_id: Uuid,
    pub content_id: Option<Uuid>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub tip_message: Option<String>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedIntent {
    pub client_secret: String,
    pub amount: i64,
    pub platform_fee: i64,
}

#[derive(Debug, Clone)]
pub struct ConfirmPaymentInput {
    pub payment_intent_id: String,
    pub kind: PurchaseKind,
    pub amount: i64,
    pub creator_id: Uuid,
    pub payer_id: Uuid,
    pub content_id: Option<Uuid>,
    pub tip_message: Option<String>,
}

pub struct SettlementUseCases {
    creator_repo: Arc<dyn CreatorRepo>,
    content_repo: Arc<dyn ContentRepo>,
    intent_repo: Arc<dyn PaymentIntentRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    ledger_repo: Arc<dyn LedgerRepo>,
    gateway: Arc<dyn PaymentGatewayPort>,
    notifier: Arc<dyn Notifier>,
    currency: String,
}

impl SettlementUseCases {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        creator_repo: Arc<dyn CreatorRepo>,
        content_repo: Arc<dyn ContentRepo>,
        intent_repo: Arc<dyn PaymentIntentRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        ledger_repo: Arc<dyn LedgerRepo>,
        gateway: Arc<dyn PaymentGatewayPort>,
        notifier: Arc<dyn Notifier>,
        currency: String,
    ) -> Self {
        Self {
            creator_repo,
            content_repo,
            intent_repo,
            subscription_repo,
            ledger_repo,
            gateway,
            notifier,
            currency,
        }
    }

    /// Prices the purchase, opens a gateway intent and records it locally as
    /// `pending`. The local row is written only after the gateway accepted.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(&self, input: CreateIntentInput) -> AppResult<CreatedIntent> {
        pricing::validate_amount(input.amount)?;
        if let Some(message) = &input.tip_message
            && !is_valid_tip_message(message)
        {
            return Err(AppError::Validation("Tip message is too long".into()));
        }

        let creator = self
            .creator_repo
            .get_by_id(input.creator_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))?;

        match input.kind {
            PurchaseKind::Subscription => {
                let now = Utc::now().naive_utc();
                if self
                    .subscription_repo
                    .find_active(input.payer_id, creator.id, now)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(
                        "Already subscribed to this creator".into(),
                    ));
                }
            }
            PurchaseKind::Ppv => {
                let content = self.ppv_content(input.content_id, creator.id).await?;
                if let Some(price) = content.price
                    && price != input.amount
                {
                    return Err(AppError::Validation(
                        "Amount does not match the content price".into(),
                    ));
                }
                if self
                    .ledger_repo
                    .has_ppv_purchase(input.payer_id, content.id)
                    .await?
                {
                    return Err(AppError::Conflict("Content already purchased".into()));
                }
            }
            PurchaseKind::LiveStream => {
                if input.content_id.is_none() {
                    return Err(AppError::Validation(
                        "contentId is required for live stream access".into(),
                    ));
                }
            }
            PurchaseKind::Tip => {}
        }

        let tier = match input.kind {
            PurchaseKind::Subscription => Some(input.subscription_tier.unwrap_or_default()),
            _ => None,
        };
        let quote = pricing::quote(input.kind, input.amount, tier);

        let metadata = IntentMetadata {
            kind: input.kind,
            payer_id: input.payer_id,
            creator_id: creator.id,
            content_id: input.content_id,
            subscription_tier: tier,
            platform_fee: quote.platform_fee,
            tip_message: input.tip_message.clone(),
        };
        let destination = creator.verified_payout_account().map(str::to_string);
        let request = CreateIntentRequest {
            amount: quote.amount,
            currency: self.currency.clone(),
            application_fee: destination.as_ref().map(|_| quote.platform_fee),
            destination_account: destination,
            metadata,
            description: Some(input.description.clone().unwrap_or_else(|| {
                format!("{} for {}", describe(input.kind), creator.display_name)
            })),
            idempotency_key: input.idempotency_key.clone(),
        };

        let gateway_intent = self
            .gateway
            .create_payment_intent(&request)
            .await
            .map_err(|e| e.in_context(CREATE_FAILED))?;
        let client_secret = gateway_intent
            .client_secret
            .clone()
            .ok_or_else(|| AppError::gateway(CREATE_FAILED, "intent has no client secret"))?;

        self.intent_repo
            .insert(&NewPaymentIntent {
                id: gateway_intent.id.clone(),
                payer_id: input.payer_id,
                creator_id: creator.id,
                amount: quote.amount,
                platform_fee: quote.platform_fee,
                kind: input.kind,
                content_id: input.content_id,
                subscription_tier: tier,
                tip_message: input.tip_message,
                idempotency_key: input.idempotency_key,
            })
            .await?;

        tracing::info!(
            intent_id = %gateway_intent.id,
            amount = quote.amount,
            platform_fee = quote.platform_fee,
            "Payment intent created"
        );

        Ok(CreatedIntent {
            client_secret,
            amount: quote.amount,
            platform_fee: quote.platform_fee,
        })
    }

    /// Marks the intent `succeeded` and applies its ledger mutation.
    /// Repeated calls for the same intent are no-ops.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, input: ConfirmPaymentInput) -> AppResult<()> {
        let mut intent = self.load_intent(&input.payment_intent_id).await?;

        let content_mismatch = intent.content_id.is_some() && input.content_id != intent.content_id;
        if intent.kind != input.kind
            || intent.amount != input.amount
            || intent.payer_id != input.payer_id
            || intent.creator_id != input.creator_id
            || content_mismatch
        {
            return Err(AppError::Validation(
                "Payment details do not match the payment intent".into(),
            ));
        }

        if intent.settled_at.is_some() {
            tracing::debug!(intent_id = %intent.id, "Payment already settled");
            return Ok(());
        }

        let remote = self
            .gateway
            .retrieve_payment_intent(&intent.id)
            .await
            .map_err(|e| e.in_context(CONFIRM_FAILED))?;
        match remote.status {
            GatewayIntentStatus::Succeeded => {}
            status if status.is_failure() => {
                self.intent_repo
                    .update_status(&intent.id, PaymentIntentStatus::Failed)
                    .await?;
                return Err(AppError::gateway(
                    "Payment failed",
                    format!("gateway reports {:?}", status),
                ));
            }
            _ => {
                return Err(AppError::Validation("Payment has not completed yet".into()));
            }
        }

        self.intent_repo
            .update_status(&intent.id, PaymentIntentStatus::Succeeded)
            .await?;

        if intent.tip_message.is_none() {
            intent.tip_message = input.tip_message;
        }
        self.settle(&intent).await?;
        Ok(())
    }

    /// Local intent row, rebuilt from gateway metadata when it is missing.
    pub async fn load_intent(&self, intent_id: &str) -> AppResult<PaymentIntentProfile> {
        if let Some(intent) = self.intent_repo.get_by_id(intent_id).await? {
            return Ok(intent);
        }
        let remote = self
            .gateway
            .retrieve_payment_intent(intent_id)
            .await
            .map_err(|e| e.in_context(CONFIRM_FAILED))?;
        self.restore_intent(&remote).await
    }

    pub async fn restore_intent(&self, remote: &GatewayIntent) -> AppResult<PaymentIntentProfile> {
        let metadata = IntentMetadata::from_map(&remote.metadata).ok_or_else(|| {
            AppError::NotFound(format!("Payment intent {} is not a platform purchase", remote.id))
        })?;

        tracing::warn!(intent_id = %remote.id, "Restoring payment intent missing from the ledger");

        self.intent_repo
            .insert(&NewPaymentIntent {
                id: remote.id.clone(),
                payer_id: metadata.payer_id,
                creator_id: metadata.creator_id,
                amount: remote.amount,
                platform_fee: metadata.platform_fee,
                kind: metadata.kind,
                content_id: metadata.content_id,
                subscription_tier: metadata.subscription_tier,
                tip_message: metadata.tip_message,
                idempotency_key: None,
            })
            .await
    }

    /// Applies the ledger mutation for a succeeded intent exactly once, then
    /// dispatches notifications outside the transaction.
    #[instrument(skip(self, intent), fields(intent_id = %intent.id, kind = %intent.kind))]
    pub async fn settle(&self, intent: &PaymentIntentProfile) -> AppResult<Settlement> {
        if intent.settled_at.is_some() {
            return Ok(Settlement::AlreadySettled);
        }
        if intent.kind == PurchaseKind::Ppv {
            self.ppv_content(intent.content_id, intent.creator_id)
                .await?;
        }

        let now = Utc::now().naive_utc();
        let tier = intent.subscription_tier.unwrap_or_default();
        let input = SettlementInput {
            payment_intent_id: intent.id.clone(),
            kind: intent.kind,
            payer_id: intent.payer_id,
            creator_id: intent.creator_id,
            amount: intent.amount,
            content_id: intent.content_id,
            subscription_tier: tier,
            tip_message: intent.tip_message.clone(),
            settled_at: now,
            expires_at: pricing::subscription_expiry(now),
        };

        let outcome = self.ledger_repo.settle(&input).await?;
        match outcome {
            Settlement::Applied => {
                tracing::info!(amount = input.amount, "Ledger credited");
                let effects = self.side_effects_for(&input).await;
                spawn_side_effects(self.notifier.clone(), effects);
            }
            Settlement::AlreadySettled => tracing::debug!("Intent settled by an earlier writer"),
            Settlement::AlreadyOwned => tracing::info!("Buyer already owns this content"),
        }
        Ok(outcome)
    }

    async fn ppv_content(&self, content_id: Option<Uuid>, creator_id: Uuid) -> AppResult<ContentItem> {
        let content_id = content_id.ok_or_else(|| {
            AppError::Validation("contentId is required for pay-per-view purchases".into())
        })?;
        let content = self
            .content_repo
            .get_by_id(content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".into()))?;
        if !content.is_ppv {
            return Err(AppError::Validation("Content is not pay-per-view".into()));
        }
        if content.creator_id != creator_id {
            return Err(AppError::Validation(
                "Content does not belong to this creator".into(),
            ));
        }
        Ok(content)
    }

    async fn side_effects_for(&self, input: &SettlementInput) -> Vec<SideEffect> {
        match input.kind {
            PurchaseKind::Subscription => {
                let mut effects = vec![SideEffect::NewSubscriber {
                    creator_id: input.creator_id,
                    amount: input.amount,
                }];
                match self.creator_repo.get_by_id(input.creator_id).await {
                    Ok(Some(creator)) => {
                        if let Some(body) = creator.welcome_message.filter(|m| !m.trim().is_empty()) {
                            effects.insert(
                                0,
                                SideEffect::WelcomeMessage {
                                    creator_id: creator.id,
                                    subscriber_id: input.payer_id,
                                    body,
                                },
                            );
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "Skipping welcome message, creator lookup failed")
                    }
                }
                effects
            }
            PurchaseKind::Tip => vec![SideEffect::NewTip {
                creator_id: input.creator_id,
                amount: input.amount,
                message: input.tip_message.clone(),
            }],
            PurchaseKind::Ppv => match input.content_id {
                Some(content_id) => vec![SideEffect::ContentPurchased {
                    creator_id: input.creator_id,
                    content_id,
                    amount: input.amount,
                }],
                None => vec![],
            },
            PurchaseKind::LiveStream => vec![],
        }
    }
}

fn describe(kind: PurchaseKind) -> &'static str {
    match kind {
        PurchaseKind::Subscription => "Subscription",
        PurchaseKind::Tip => "Tip",
        PurchaseKind::Ppv => "Pay-per-view content",
        PurchaseKind::LiveStream => "Live stream access",
    }
}
