//! Ledger records and the repository traits the use cases persist through.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::{
        payment_intent_status::PaymentIntentStatus,
        payout_status::{PayoutAccountStatus, PayoutStatus},
        purchase_kind::PurchaseKind,
        subscription_status::SubscriptionStatus,
        subscription_tier::SubscriptionTier,
    },
};

// ============================================================================
// Records
// ============================================================================

/// Creator row, including the running ledger summary.
#[derive(Debug, Clone)]
pub struct CreatorProfile {
    pub id: Uuid,
    pub display_name: String,
    pub welcome_message: Option<String>,
    pub total_earnings: i64,
    pub total_subscribers: i64,
    pub total_posts: i64,
    pub payout_account_id: Option<String>,
    pub payout_account_status: Option<PayoutAccountStatus>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl CreatorProfile {
    /// Account that may receive destination charges and transfers.
    pub fn verified_payout_account(&self) -> Option<&str> {
        match self.payout_account_status {
            Some(PayoutAccountStatus::Verified) => self.payout_account_id.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Post,
    Message,
}

/// A priced post or message.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub source: ContentSource,
    pub is_ppv: bool,
    pub price: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PaymentIntentProfile {
    pub id: String,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub platform_fee: i64,
    pub kind: PurchaseKind,
    pub status: PaymentIntentStatus,
    pub content_id: Option<Uuid>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub tip_message: Option<String>,
    pub idempotency_key: Option<String>,
    pub settled_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub id: String,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub platform_fee: i64,
    pub kind: PurchaseKind,
    pub content_id: Option<Uuid>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub tip_message: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionProfile {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub creator_id: Uuid,
    pub amount_paid: i64,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub started_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub auto_renew: bool,
    pub payment_intent_id: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct TipProfile {
    pub id: Uuid,
    pub tipper_id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub message: Option<String>,
    pub payment_intent_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct PpvPurchaseProfile {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub content_id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub payment_intent_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct PayoutProfile {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub status: PayoutStatus,
    pub transfer_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Everything a ledger mutation needs, taken from the stored intent.
#[derive(Debug, Clone)]
pub struct SettlementInput {
    pub payment_intent_id: String,
    pub kind: PurchaseKind,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub content_id: Option<Uuid>,
    pub subscription_tier: SubscriptionTier,
    pub tip_message: Option<String>,
    pub settled_at: NaiveDateTime,
    /// Only read for subscriptions.
    pub expires_at: NaiveDateTime,
}

/// Result of applying one ledger mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Rows were written and the creator credited.
    Applied,
    /// The intent had already been settled by an earlier writer.
    AlreadySettled,
    /// PPV content the buyer already owns; intent claimed, nothing credited.
    AlreadyOwned,
}

// ============================================================================
// Repository traits
// ============================================================================

#[async_trait]
pub trait CreatorRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<CreatorProfile>>;

    async fn set_payout_account(
        &self,
        creator_id: Uuid,
        account_id: &str,
        status: PayoutAccountStatus,
    ) -> AppResult<()>;

    /// Returns false when no creator owns the account.
    async fn update_payout_account_status(
        &self,
        account_id: &str,
        status: PayoutAccountStatus,
    ) -> AppResult<bool>;
}

#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn get_by_id(&self, content_id: Uuid) -> AppResult<Option<ContentItem>>;
}

#[async_trait]
pub trait PaymentIntentRepo: Send + Sync {
    /// Inserts a `pending` intent. A row with the same id is left untouched.
    async fn insert(&self, intent: &NewPaymentIntent) -> AppResult<PaymentIntentProfile>;

    async fn get_by_id(&self, id: &str) -> AppResult<Option<PaymentIntentProfile>>;

    /// Applies [`PaymentIntentStatus::transition`] atomically.
    /// Returns the stored status, or `None` when the intent is unknown.
    async fn update_status(
        &self,
        id: &str,
        status: PaymentIntentStatus,
    ) -> AppResult<Option<PaymentIntentStatus>>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionProfile>>;

    /// Flips lapsed `active` rows of the pair to `expired`, then returns the
    /// remaining active subscription, if any.
    async fn find_active(
        &self,
        subscriber_id: Uuid,
        creator_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Option<SubscriptionProfile>>;

    async fn cancel(&self, id: Uuid) -> AppResult<SubscriptionProfile>;

    /// Fails with `Conflict` if another active subscription exists for the pair.
    async fn reactivate(&self, id: Uuid) -> AppResult<SubscriptionProfile>;
}

#[async_trait]
pub trait LedgerRepo: Send + Sync {
    /// Claims the intent and applies the mutation for its kind in one
    /// transaction, including the atomic creator counter increments.
    async fn settle(&self, input: &SettlementInput) -> AppResult<Settlement>;

    async fn has_ppv_purchase(&self, buyer_id: Uuid, content_id: Uuid) -> AppResult<bool>;

    /// Subscriptions plus tips created in `[start, end)`.
    async fn earnings_between(
        &self,
        creator_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<i64>;
}

#[async_trait]
pub trait PayoutRepo: Send + Sync {
    /// Sum of every payout that has not failed.
    async fn committed_total(&self, creator_id: Uuid) -> AppResult<i64>;

    async fn latest(&self, creator_id: Uuid) -> AppResult<Option<PayoutProfile>>;

    /// Locks the creator and returns its unsent `pending` payout if one
    /// exists. Otherwise recomputes the pending balance and inserts a
    /// `pending` payout for all of it. Returns `None` below `minimum`.
    async fn open_payout(&self, creator_id: Uuid, minimum: i64)
    -> AppResult<Option<PayoutProfile>>;

    async fn set_transfer(&self, payout_id: Uuid, transfer_id: &str) -> AppResult<()>;

    async fn mark_failed(&self, payout_id: Uuid, reason: &str) -> AppResult<()>;

    /// Matches by transfer id first, then by `payout_id`.
    /// Returns false when no payout matched.
    async fn mark_completed(&self, transfer_id: &str, payout_id: Option<Uuid>)
    -> AppResult<bool>;
}

#[async_trait]
pub trait GatewayEventRepo: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool>;

    async fn record_processed(&self, event_id: &str, event_type: &str) -> AppResult<()>;
}
