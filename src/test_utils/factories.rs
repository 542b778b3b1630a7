//! Factories for records with sensible defaults.
//!
//! Use the closure parameter to override specific fields.

use chrono::{Duration, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    application::use_cases::ledger::{
        ContentItem, ContentSource, CreatorProfile, PaymentIntentProfile, PayoutProfile,
        SubscriptionProfile,
    },
    domain::entities::{
        payment_intent_status::PaymentIntentStatus, payout_status::PayoutStatus,
        purchase_kind::PurchaseKind, subscription_status::SubscriptionStatus,
        subscription_tier::SubscriptionTier,
    },
};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Creator without a payout account and an empty ledger summary.
pub fn create_test_creator(overrides: impl FnOnce(&mut CreatorProfile)) -> CreatorProfile {
    let mut creator = CreatorProfile {
        id: Uuid::new_v4(),
        display_name: "Test Creator".to_string(),
        welcome_message: None,
        total_earnings: 0,
        total_subscribers: 0,
        total_posts: 0,
        payout_account_id: None,
        payout_account_status: None,
        created_at: Some(now()),
        updated_at: Some(now()),
    };
    overrides(&mut creator);
    creator
}

/// Pay-per-view post priced at $15.00.
pub fn create_test_post(creator_id: Uuid, overrides: impl FnOnce(&mut ContentItem)) -> ContentItem {
    let mut post = ContentItem {
        id: Uuid::new_v4(),
        creator_id,
        source: ContentSource::Post,
        is_ppv: true,
        price: Some(1500),
    };
    overrides(&mut post);
    post
}

/// Pending, unsettled $5.00 tip intent.
pub fn create_test_intent(
    payer_id: Uuid,
    creator_id: Uuid,
    overrides: impl FnOnce(&mut PaymentIntentProfile),
) -> PaymentIntentProfile {
    let mut intent = PaymentIntentProfile {
        id: format!("pi_test_{}", Uuid::new_v4().simple()),
        payer_id,
        creator_id,
        amount: 500,
        platform_fee: 25,
        kind: PurchaseKind::Tip,
        status: PaymentIntentStatus::Pending,
        content_id: None,
        subscription_tier: None,
        tip_message: None,
        idempotency_key: None,
        settled_at: None,
        created_at: Some(now()),
        updated_at: Some(now()),
    };
    overrides(&mut intent);
    intent
}

/// Active monthly subscription with a month left on it.
pub fn create_test_subscription(
    subscriber_id: Uuid,
    creator_id: Uuid,
    overrides: impl FnOnce(&mut SubscriptionProfile),
) -> SubscriptionProfile {
    let started_at = now();
    let mut subscription = SubscriptionProfile {
        id: Uuid::new_v4(),
        subscriber_id,
        creator_id,
        amount_paid: 999,
        tier: SubscriptionTier::Monthly,
        status: SubscriptionStatus::Active,
        started_at,
        expires_at: started_at + Duration::days(30),
        auto_renew: true,
        payment_intent_id: None,
        created_at: Some(started_at),
        updated_at: Some(started_at),
    };
    overrides(&mut subscription);
    subscription
}

/// Pending $50.00 payout without a transfer yet.
pub fn create_test_payout(creator_id: Uuid, overrides: impl FnOnce(&mut PayoutProfile)) -> PayoutProfile {
    let mut payout = PayoutProfile {
        id: Uuid::new_v4(),
        creator_id,
        amount: 5000,
        status: PayoutStatus::Pending,
        transfer_id: None,
        failure_reason: None,
        created_at: now(),
        updated_at: None,
    };
    overrides(&mut payout);
    payout
}
