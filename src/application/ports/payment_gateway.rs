use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::{purchase_kind::PurchaseKind, subscription_tier::SubscriptionTier},
};

// ============================================================================
// Port Types - Gateway-agnostic request/response shapes
// ============================================================================

/// Purchase details attached to a gateway intent.
///
/// Travels as string metadata so a webhook can rebuild the local intent row
/// when the process died between the gateway call and the local insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    pub kind: PurchaseKind,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub content_id: Option<Uuid>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub platform_fee: i64,
    pub tip_message: Option<String>,
}

impl IntentMetadata {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("type".to_string(), self.kind.as_str().to_string()),
            ("user_id".to_string(), self.payer_id.to_string()),
            ("creator_id".to_string(), self.creator_id.to_string()),
            ("platform_fee".to_string(), self.platform_fee.to_string()),
        ];
        if let Some(content_id) = self.content_id {
            pairs.push(("content_id".to_string(), content_id.to_string()));
        }
        if let Some(tier) = self.subscription_tier {
            pairs.push(("subscription_tier".to_string(), tier.as_str().to_string()));
        }
        if let Some(message) = &self.tip_message {
            pairs.push(("tip_message".to_string(), message.clone()));
        }
        pairs
    }

    /// Returns `None` when a required key is missing or malformed.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let kind = map.get("type")?.parse().ok()?;
        let payer_id = map.get("user_id")?.parse().ok()?;
        let creator_id = map.get("creator_id")?.parse().ok()?;
        let platform_fee = map.get("platform_fee")?.parse().ok()?;
        let content_id = match map.get("content_id") {
            Some(raw) => Some(raw.parse().ok()?),
            None => None,
        };
        let subscription_tier = match map.get("subscription_tier") {
            Some(raw) => Some(raw.parse().ok()?),
            None => None,
        };
        Some(Self {
            kind,
            payer_id,
            creator_id,
            content_id,
            subscription_tier,
            platform_fee,
            tip_message: map.get("tip_message").cloned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    pub amount: i64,
    pub currency: String,
    /// Set together with `destination_account` for destination charges.
    pub application_fee: Option<i64>,
    pub destination_account: Option<String>,
    pub metadata: IntentMetadata,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayIntentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    Canceled,
}

impl GatewayIntentStatus {
    /// The charge can no longer succeed without the payer starting over.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            GatewayIntentStatus::Canceled | GatewayIntentStatus::RequiresPaymentMethod
        )
    }
}

impl std::str::FromStr for GatewayIntentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(GatewayIntentStatus::Succeeded),
            "processing" => Ok(GatewayIntentStatus::Processing),
            "requires_action" => Ok(GatewayIntentStatus::RequiresAction),
            "requires_payment_method" => Ok(GatewayIntentStatus::RequiresPaymentMethod),
            "requires_confirmation" => Ok(GatewayIntentStatus::RequiresConfirmation),
            "canceled" => Ok(GatewayIntentStatus::Canceled),
            _ => Err(format!("Unknown payment intent status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: GatewayIntentStatus,
    pub amount: i64,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ConnectedAccountRequest {
    pub creator_id: Uuid,
    pub email: String,
    pub country: String,
    pub business_type: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectedAccount {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct AccountLink {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub amount: i64,
    pub currency: String,
    pub destination_account: String,
    pub payout_id: Uuid,
    pub idempotency_key: String,
}

#[derive(Debug, Clone)]
pub struct Transfer {
    pub id: String,
}

// ============================================================================
// Payment Gateway Port
// ============================================================================

/// Card-processing operations the settlement workflow depends on.
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    async fn create_payment_intent(&self, request: &CreateIntentRequest)
    -> AppResult<GatewayIntent>;

    async fn retrieve_payment_intent(&self, intent_id: &str) -> AppResult<GatewayIntent>;

    async fn create_connected_account(
        &self,
        request: &ConnectedAccountRequest,
    ) -> AppResult<ConnectedAccount>;

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> AppResult<AccountLink>;

    async fn create_transfer(&self, request: &TransferRequest) -> AppResult<Transfer>;
}
