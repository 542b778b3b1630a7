pub mod payment_intent_status;
pub mod payout_status;
pub mod purchase_kind;
pub mod subscription_status;
pub mod subscription_tier;
