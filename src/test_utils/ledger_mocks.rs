//! In-memory ledger implementing every repository trait.
//!
//! All state sits behind one mutex so each trait call is atomic, the same
//! guarantee the Postgres adapter gets from its transactions.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{
        ContentItem, ContentRepo, CreatorProfile, CreatorRepo, GatewayEventRepo, LedgerRepo,
        NewPaymentIntent, PaymentIntentProfile, PaymentIntentRepo, PayoutProfile, PayoutRepo,
        PpvPurchaseProfile, Settlement, SettlementInput, SubscriptionProfile, SubscriptionRepo,
        TipProfile,
    },
    domain::entities::{
        payment_intent_status::PaymentIntentStatus,
        payout_status::{PayoutAccountStatus, PayoutStatus},
        purchase_kind::PurchaseKind,
        subscription_status::SubscriptionStatus,
    },
};

#[derive(Default)]
pub struct LedgerState {
    pub creators: HashMap<Uuid, CreatorProfile>,
    pub content: HashMap<Uuid, ContentItem>,
    pub intents: HashMap<String, PaymentIntentProfile>,
    pub subscriptions: HashMap<Uuid, SubscriptionProfile>,
    pub tips: Vec<TipProfile>,
    pub ppv_purchases: Vec<PpvPurchaseProfile>,
    pub payouts: HashMap<Uuid, PayoutProfile>,
    pub events: HashMap<String, String>,
}

impl LedgerState {
    fn expire_lapsed(&mut self, subscriber_id: Uuid, creator_id: Uuid, now: NaiveDateTime) {
        for sub in self.subscriptions.values_mut() {
            if sub.subscriber_id == subscriber_id
                && sub.creator_id == creator_id
                && sub.status == SubscriptionStatus::Active
                && sub.expires_at <= now
            {
                sub.status = SubscriptionStatus::Expired;
            }
        }
    }

    fn active_for(&self, subscriber_id: Uuid, creator_id: Uuid) -> Option<&SubscriptionProfile> {
        self.subscriptions.values().find(|s| {
            s.subscriber_id == subscriber_id
                && s.creator_id == creator_id
                && s.status == SubscriptionStatus::Active
        })
    }

    fn committed_total(&self, creator_id: Uuid) -> i64 {
        self.payouts
            .values()
            .filter(|p| p.creator_id == creator_id && p.status != PayoutStatus::Failed)
            .map(|p| p.amount)
            .sum()
    }
}

#[derive(Default)]
pub struct InMemoryLedger {
    pub state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creator(self, creator: CreatorProfile) -> Self {
        self.state.lock().unwrap().creators.insert(creator.id, creator);
        self
    }

    pub fn with_payout(self, payout: PayoutProfile) -> Self {
        self.insert_payout(payout);
        self
    }

    pub fn insert_content(&self, item: ContentItem) {
        self.state.lock().unwrap().content.insert(item.id, item);
    }

    pub fn insert_intent(&self, intent: PaymentIntentProfile) {
        self.state
            .lock()
            .unwrap()
            .intents
            .insert(intent.id.clone(), intent);
    }

    pub fn remove_intent(&self, id: &str) {
        self.state.lock().unwrap().intents.remove(id);
    }

    pub fn insert_subscription(&self, subscription: SubscriptionProfile) {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(subscription.id, subscription);
    }

    pub fn insert_payout(&self, payout: PayoutProfile) {
        self.state.lock().unwrap().payouts.insert(payout.id, payout);
    }

    pub fn creator(&self, id: Uuid) -> Option<CreatorProfile> {
        self.state.lock().unwrap().creators.get(&id).cloned()
    }

    pub fn intent(&self, id: &str) -> Option<PaymentIntentProfile> {
        self.state.lock().unwrap().intents.get(id).cloned()
    }

    pub fn intent_count(&self) -> usize {
        self.state.lock().unwrap().intents.len()
    }

    pub fn subscription(&self, id: Uuid) -> Option<SubscriptionProfile> {
        self.state.lock().unwrap().subscriptions.get(&id).cloned()
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionProfile> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .values()
            .cloned()
            .collect()
    }

    pub fn tips(&self) -> Vec<TipProfile> {
        self.state.lock().unwrap().tips.clone()
    }

    pub fn ppv_purchases(&self) -> Vec<PpvPurchaseProfile> {
        self.state.lock().unwrap().ppv_purchases.clone()
    }

    pub fn payout(&self, id: Uuid) -> Option<PayoutProfile> {
        self.state.lock().unwrap().payouts.get(&id).cloned()
    }

    pub fn payouts(&self) -> Vec<PayoutProfile> {
        self.state.lock().unwrap().payouts.values().cloned().collect()
    }

    /// Earnings recomputed from the underlying rows, for checking the
    /// running `total_earnings` counter.
    pub fn derived_earnings(&self, creator_id: Uuid) -> i64 {
        let state = self.state.lock().unwrap();
        let tips: i64 = state
            .tips
            .iter()
            .filter(|t| t.creator_id == creator_id)
            .map(|t| t.amount)
            .sum();
        let subscriptions: i64 = state
            .subscriptions
            .values()
            .filter(|s| s.creator_id == creator_id)
            .map(|s| s.amount_paid)
            .sum();
        let ppv: i64 = state
            .ppv_purchases
            .iter()
            .filter(|p| p.creator_id == creator_id)
            .map(|p| p.amount)
            .sum();
        let live: i64 = state
            .intents
            .values()
            .filter(|i| {
                i.creator_id == creator_id
                    && i.kind == PurchaseKind::LiveStream
                    && i.settled_at.is_some()
            })
            .map(|i| i.amount)
            .sum();
        tips + subscriptions + ppv + live
    }
}

#[async_trait]
impl CreatorRepo for InMemoryLedger {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<CreatorProfile>> {
        Ok(self.creator(id))
    }

    async fn set_payout_account(
        &self,
        creator_id: Uuid,
        account_id: &str,
        status: PayoutAccountStatus,
    ) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let creator = state
            .creators
            .get_mut(&creator_id)
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))?;
        creator.payout_account_id = Some(account_id.to_string());
        creator.payout_account_status = Some(status);
        Ok(())
    }

    async fn update_payout_account_status(
        &self,
        account_id: &str,
        status: PayoutAccountStatus,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .creators
            .values_mut()
            .find(|c| c.payout_account_id.as_deref() == Some(account_id))
        {
            Some(creator) => {
                creator.payout_account_status = Some(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ContentRepo for InMemoryLedger {
    async fn get_by_id(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        Ok(self.state.lock().unwrap().content.get(&content_id).cloned())
    }
}

#[async_trait]
impl PaymentIntentRepo for InMemoryLedger {
    async fn insert(&self, intent: &NewPaymentIntent) -> AppResult<PaymentIntentProfile> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now().naive_utc();
        let stored = state
            .intents
            .entry(intent.id.clone())
            .or_insert_with(|| PaymentIntentProfile {
                id: intent.id.clone(),
                payer_id: intent.payer_id,
                creator_id: intent.creator_id,
                amount: intent.amount,
                platform_fee: intent.platform_fee,
                kind: intent.kind,
                status: PaymentIntentStatus::Pending,
                content_id: intent.content_id,
                subscription_tier: intent.subscription_tier,
                tip_message: intent.tip_message.clone(),
                idempotency_key: intent.idempotency_key.clone(),
                settled_at: None,
                created_at: Some(now),
                updated_at: Some(now),
            });
        Ok(stored.clone())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<PaymentIntentProfile>> {
        Ok(self.intent(id))
    }

    async fn update_status(
        &self,
        id: &str,
        status: PaymentIntentStatus,
    ) -> AppResult<Option<PaymentIntentStatus>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.intents.get_mut(id).map(|intent| {
            intent.status = intent.status.transition(status);
            intent.updated_at = Some(Utc::now().naive_utc());
            intent.status
        }))
    }
}

#[async_trait]
impl SubscriptionRepo for InMemoryLedger {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self.subscription(id))
    }

    async fn find_active(
        &self,
        subscriber_id: Uuid,
        creator_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Option<SubscriptionProfile>> {
        let mut state = self.state.lock().unwrap();
        state.expire_lapsed(subscriber_id, creator_id, now);
        Ok(state.active_for(subscriber_id, creator_id).cloned())
    }

    async fn cancel(&self, id: Uuid) -> AppResult<SubscriptionProfile> {
        let mut state = self.state.lock().unwrap();
        let sub = state
            .subscriptions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;
        sub.status = SubscriptionStatus::Cancelled;
        sub.auto_renew = false;
        sub.updated_at = Some(Utc::now().naive_utc());
        Ok(sub.clone())
    }

    async fn reactivate(&self, id: Uuid) -> AppResult<SubscriptionProfile> {
        let mut state = self.state.lock().unwrap();
        let (subscriber_id, creator_id) = state
            .subscriptions
            .get(&id)
            .map(|s| (s.subscriber_id, s.creator_id))
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;
        if state
            .active_for(subscriber_id, creator_id)
            .is_some_and(|s| s.id != id)
        {
            return Err(AppError::Conflict(
                "Already subscribed to this creator".into(),
            ));
        }
        let sub = state
            .subscriptions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;
        sub.status = SubscriptionStatus::Active;
        sub.auto_renew = true;
        sub.updated_at = Some(Utc::now().naive_utc());
        Ok(sub.clone())
    }
}

#[async_trait]
impl LedgerRepo for InMemoryLedger {
    async fn settle(&self, input: &SettlementInput) -> AppResult<Settlement> {
        let mut state = self.state.lock().unwrap();

        let already_settled = state
            .intents
            .get(&input.payment_intent_id)
            .is_none_or(|i| i.settled_at.is_some());
        if already_settled {
            return Ok(Settlement::AlreadySettled);
        }
        if !state.creators.contains_key(&input.creator_id) {
            return Err(AppError::NotFound("Creator not found".into()));
        }

        let mut credited = true;
        match input.kind {
            PurchaseKind::Subscription => {
                state.expire_lapsed(input.payer_id, input.creator_id, input.settled_at);
                if state.active_for(input.payer_id, input.creator_id).is_some() {
                    return Err(AppError::Conflict(
                        "Already subscribed to this creator".into(),
                    ));
                }
                let id = Uuid::new_v4();
                state.subscriptions.insert(
                    id,
                    SubscriptionProfile {
                        id,
                        subscriber_id: input.payer_id,
                        creator_id: input.creator_id,
                        amount_paid: input.amount,
                        tier: input.subscription_tier,
                        status: SubscriptionStatus::Active,
                        started_at: input.settled_at,
                        expires_at: input.expires_at,
                        auto_renew: true,
                        payment_intent_id: Some(input.payment_intent_id.clone()),
                        created_at: Some(input.settled_at),
                        updated_at: Some(input.settled_at),
                    },
                );
            }
            PurchaseKind::Tip => state.tips.push(TipProfile {
                id: Uuid::new_v4(),
                tipper_id: input.payer_id,
                creator_id: input.creator_id,
                amount: input.amount,
                message: input.tip_message.clone(),
                payment_intent_id: input.payment_intent_id.clone(),
                created_at: input.settled_at,
            }),
            PurchaseKind::Ppv => {
                let content_id = input
                    .content_id
                    .ok_or_else(|| AppError::Validation("contentId is required".into()))?;
                let owned = state
                    .ppv_purchases
                    .iter()
                    .any(|p| p.buyer_id == input.payer_id && p.content_id == content_id);
                if owned {
                    credited = false;
                } else {
                    state.ppv_purchases.push(PpvPurchaseProfile {
                        id: Uuid::new_v4(),
                        buyer_id: input.payer_id,
                        content_id,
                        creator_id: input.creator_id,
                        amount: input.amount,
                        payment_intent_id: input.payment_intent_id.clone(),
                        created_at: input.settled_at,
                    });
                }
            }
            PurchaseKind::LiveStream => {}
        }

        if let Some(intent) = state.intents.get_mut(&input.payment_intent_id) {
            intent.settled_at = Some(input.settled_at);
        }
        if !credited {
            return Ok(Settlement::AlreadyOwned);
        }
        if let Some(creator) = state.creators.get_mut(&input.creator_id) {
            creator.total_earnings += input.amount;
            if input.kind == PurchaseKind::Subscription {
                creator.total_subscribers += 1;
            }
        }
        Ok(Settlement::Applied)
    }

    async fn has_ppv_purchase(&self, buyer_id: Uuid, content_id: Uuid) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .ppv_purchases
            .iter()
            .any(|p| p.buyer_id == buyer_id && p.content_id == content_id))
    }

    async fn earnings_between(
        &self,
        creator_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<i64> {
        let state = self.state.lock().unwrap();
        let in_window = |at: NaiveDateTime| at >= start && at < end;
        let subscriptions: i64 = state
            .subscriptions
            .values()
            .filter(|s| s.creator_id == creator_id && s.created_at.is_some_and(in_window))
            .map(|s| s.amount_paid)
            .sum();
        let tips: i64 = state
            .tips
            .iter()
            .filter(|t| t.creator_id == creator_id && in_window(t.created_at))
            .map(|t| t.amount)
            .sum();
        Ok(subscriptions + tips)
    }
}

#[async_trait]
impl PayoutRepo for InMemoryLedger {
    async fn committed_total(&self, creator_id: Uuid) -> AppResult<i64> {
        Ok(self.state.lock().unwrap().committed_total(creator_id))
    }

    async fn latest(&self, creator_id: Uuid) -> AppResult<Option<PayoutProfile>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .payouts
            .values()
            .filter(|p| p.creator_id == creator_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn open_payout(
        &self,
        creator_id: Uuid,
        minimum: i64,
    ) -> AppResult<Option<PayoutProfile>> {
        let mut state = self.state.lock().unwrap();
        let earnings = state
            .creators
            .get(&creator_id)
            .map(|c| c.total_earnings)
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))?;
        if let Some(unsent) = state
            .payouts
            .values()
            .filter(|p| {
                p.creator_id == creator_id
                    && p.status == PayoutStatus::Pending
                    && p.transfer_id.is_none()
            })
            .min_by_key(|p| p.created_at)
        {
            return Ok(Some(unsent.clone()));
        }
        let pending = (earnings - state.committed_total(creator_id)).max(0);
        if pending < minimum {
            return Ok(None);
        }
        let payout = PayoutProfile {
            id: Uuid::new_v4(),
            creator_id,
            amount: pending,
            status: PayoutStatus::Pending,
            transfer_id: None,
            failure_reason: None,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        };
        state.payouts.insert(payout.id, payout.clone());
        Ok(Some(payout))
    }

    async fn set_transfer(&self, payout_id: Uuid, transfer_id: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let payout = state
            .payouts
            .get_mut(&payout_id)
            .ok_or_else(|| AppError::NotFound("Payout not found".into()))?;
        payout.transfer_id = Some(transfer_id.to_string());
        Ok(())
    }

    async fn mark_failed(&self, payout_id: Uuid, reason: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let payout = state
            .payouts
            .get_mut(&payout_id)
            .ok_or_else(|| AppError::NotFound("Payout not found".into()))?;
        payout.status = PayoutStatus::Failed;
        payout.failure_reason = Some(reason.to_string());
        Ok(())
    }

    async fn mark_completed(&self, transfer_id: &str, payout_id: Option<Uuid>) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        let matched = state
            .payouts
            .values()
            .find(|p| p.transfer_id.as_deref() == Some(transfer_id))
            .map(|p| p.id)
            .or(payout_id.filter(|id| state.payouts.contains_key(id)));
        match matched.and_then(|id| state.payouts.get_mut(&id)) {
            Some(payout) => {
                payout.status = PayoutStatus::Completed;
                payout.transfer_id.get_or_insert_with(|| transfer_id.to_string());
                payout.updated_at = Some(Utc::now().naive_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl GatewayEventRepo for InMemoryLedger {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        Ok(self.state.lock().unwrap().events.contains_key(event_id))
    }

    async fn record_processed(&self, event_id: &str, event_type: &str) -> AppResult<()> {
        self.state
            .lock()
            .unwrap()
            .events
            .insert(event_id.to_string(), event_type.to_string());
        Ok(())
    }
}
