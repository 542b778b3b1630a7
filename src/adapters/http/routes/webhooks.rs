use axum::body::Bytes;
use chrono::Utc;
use secrecy::ExposeSecret;

use super::common::*;
use crate::{
    application::use_cases::reconciliation::GatewayEvent,
    infra::{
        stripe_client::StripeWebhookEvent,
        webhook_signature::{SIGNATURE_HEADER, verify_webhook_signature},
    },
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Failures worth a redelivery from the gateway. Anything else would fail
/// the same way again, so the event is acknowledged.
fn is_retryable_error(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Gateway { .. }
            | AppError::GatewayOutcomeUnknown { .. }
    )
}

/// POST /api/webhooks/stripe
///
/// The body is taken as raw bytes: the signature covers the exact payload.
async fn handle_stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidSignature("Missing signature header".into()))?;

    verify_webhook_signature(
        &body,
        signature,
        app_state.config.stripe_webhook_secret.expose_secret(),
        app_state.config.webhook_tolerance_secs,
        Utc::now().timestamp(),
    )?;

    let event: StripeWebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

    let reconciliation = &app_state.reconciliation_use_cases;
    if reconciliation.is_event_processed(&event.id).await? {
        tracing::debug!(event_id = %event.id, "Webhook event already processed");
        return Ok(Json(json!({ "received": true })));
    }

    let outcome = match event.to_gateway_event() {
        Ok(GatewayEvent::Unhandled) => {
            tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
            Ok(())
        }
        Ok(decoded) => reconciliation.apply(decoded).await,
        Err(err) => Err(err),
    };

    if let Err(err) = outcome {
        if is_retryable_error(&err) {
            tracing::error!(
                event_type = %event.event_type,
                event_id = %event.id,
                error = %err,
                retryable = true,
                "Webhook handling failed"
            );
            return Err(err);
        }
        tracing::warn!(
            event_type = %event.event_type,
            event_id = %event.id,
            error = %err,
            retryable = false,
            "Webhook event could not be applied"
        );
    }

    reconciliation
        .record_event_processed(&event.id, &event.event_type)
        .await?;
    Ok(Json(json!({ "received": true })))
}
