use std::{collections::HashMap, time::Duration};

use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{GatewayIntent, GatewayIntentStatus},
        use_cases::reconciliation::GatewayEvent,
    },
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Context shown to callers when Stripe answers with an error.
const GATEWAY_ERROR: &str = "Payment gateway error";
const GATEWAY_UNAVAILABLE: &str = "Payment gateway unavailable";

type FormParams = Vec<(String, String)>;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(secret_key: SecretString, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, secret_key })
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    fn post(&self, path: &str, params: &FormParams, idempotency_key: Option<&str>) -> RequestBuilder {
        let mut request = self
            .client
            .post(format!("{}/{}", STRIPE_API_BASE, path))
            .header("Authorization", self.auth_header())
            .form(params);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }
        request
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request.send().await.map_err(|e| {
            let detail = format!("Stripe request failed: {}", e);
            // A failed connect never delivered the request; anything later might have.
            if e.is_connect() {
                AppError::gateway(GATEWAY_UNAVAILABLE, detail)
            } else {
                AppError::gateway_outcome_unknown(GATEWAY_UNAVAILABLE, detail)
            }
        })?;
        self.handle_response(response).await
    }

    // ========================================================================
    // Payment intents
    // ========================================================================

    pub async fn create_payment_intent(
        &self,
        params: &FormParams,
        idempotency_key: Option<&str>,
    ) -> AppResult<StripePaymentIntent> {
        self.send(self.post("payment_intents", params, idempotency_key))
            .await
    }

    pub async fn retrieve_payment_intent(&self, intent_id: &str) -> AppResult<StripePaymentIntent> {
        let request = self
            .client
            .get(format!("{}/payment_intents/{}", STRIPE_API_BASE, intent_id))
            .header("Authorization", self.auth_header());
        self.send(request).await
    }

    // ========================================================================
    // Connect
    // ========================================================================

    pub async fn create_account(
        &self,
        params: &FormParams,
        idempotency_key: Option<&str>,
    ) -> AppResult<StripeAccount> {
        self.send(self.post("accounts", params, idempotency_key)).await
    }

    pub async fn create_account_link(&self, params: &FormParams) -> AppResult<StripeAccountLink> {
        self.send(self.post("account_links", params, None)).await
    }

    pub async fn create_transfer(
        &self,
        params: &FormParams,
        idempotency_key: &str,
    ) -> AppResult<StripeTransfer> {
        self.send(self.post("transfers", params, Some(idempotency_key)))
            .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                AppError::gateway_outcome_unknown(
                    GATEWAY_UNAVAILABLE,
                    format!("Failed to read response: {}", e),
                )
            })?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .map(|e| e.error.message.unwrap_or(e.error.error_type))
                .unwrap_or_else(|_| format!("{} - {}", status, body));

            return Err(classify_error_status(status, message));
        }

        // The call succeeded on Stripe's side even if the body is unreadable here.
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::gateway_outcome_unknown(
                GATEWAY_ERROR,
                format!("Failed to parse Stripe response: {}", e),
            )
        })
    }
}

/// Stripe treats 5xx results as indeterminate; every other error status
/// is a definite rejection.
fn classify_error_status(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(format!("Stripe resource not found: {}", message))
    } else if status.is_server_error() {
        AppError::gateway_outcome_unknown(GATEWAY_ERROR, message)
    } else {
        AppError::gateway(GATEWAY_ERROR, message)
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl TryFrom<StripePaymentIntent> for GatewayIntent {
    type Error = AppError;

    fn try_from(intent: StripePaymentIntent) -> Result<Self, Self::Error> {
        let status: GatewayIntentStatus = intent
            .status
            .parse()
            .map_err(|e: String| AppError::gateway(GATEWAY_ERROR, e))?;
        Ok(GatewayIntent {
            id: intent.id,
            client_secret: intent.client_secret,
            status,
            amount: intent.amount,
            metadata: intent.metadata,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeAccount {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct StripeAccountLink {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeTransfer {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
}

// ============================================================================
// Webhook Event Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeWebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEventData {
    pub object: serde_json::Value,
}

impl StripeWebhookEvent {
    fn object<T: for<'de> Deserialize<'de>>(&self) -> AppResult<T> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            AppError::Validation(format!("Malformed {} payload: {}", self.event_type, e))
        })
    }

    /// Decodes the event into the reconciler's vocabulary.
    pub fn to_gateway_event(&self) -> AppResult<GatewayEvent> {
        match self.event_type.as_str() {
            "payment_intent.succeeded" => {
                let intent: StripePaymentIntent = self.object()?;
                Ok(GatewayEvent::PaymentSucceeded(intent.try_into()?))
            }
            "payment_intent.payment_failed" => {
                let intent: StripePaymentIntent = self.object()?;
                Ok(GatewayEvent::PaymentFailed {
                    intent_id: intent.id,
                })
            }
            "account.updated" => {
                let account: StripeAccount = self.object()?;
                Ok(GatewayEvent::AccountUpdated {
                    account_id: account.id,
                    charges_enabled: account.charges_enabled,
                    payouts_enabled: account.payouts_enabled,
                })
            }
            "transfer.created" => {
                let transfer: StripeTransfer = self.object()?;
                let payout_id = transfer
                    .metadata
                    .get("payout_id")
                    .and_then(|id| id.parse::<Uuid>().ok());
                Ok(GatewayEvent::TransferCreated {
                    transfer_id: transfer.id,
                    payout_id,
                })
            }
            _ => Ok(GatewayEvent::Unhandled),
        }
    }
}
