use std::sync::Arc;

use super::common::*;
use crate::application::use_cases::settlement::{
    ConfirmPaymentInput, CreateIntentInput, CreatedIntent, SettlementUseCases,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-intent", post(create_intent))
        .route("/confirm", post(confirm))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentPayload {
    #[serde(rename = "type")]
    kind: String,
    amount: i64,
    creator_id: Uuid,
    user_id: Uuid,
    content_id: Option<Uuid>,
    subscription_tier: Option<String>,
    tip_message: Option<String>,
    description: Option<String>,
    idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmPayload {
    payment_intent_id: String,
    #[serde(rename = "type")]
    kind: String,
    amount: i64,
    creator_id: Uuid,
    user_id: Uuid,
    content_id: Option<Uuid>,
    tip_message: Option<String>,
}

/// POST /api/payments/create-intent
async fn create_intent(
    State(settlement): State<Arc<SettlementUseCases>>,
    Json(payload): Json<CreateIntentPayload>,
) -> AppResult<Json<CreatedIntent>> {
    let subscription_tier = payload
        .subscription_tier
        .as_deref()
        .map(parse_field)
        .transpose()?;

    let created = settlement
        .create_payment_intent(CreateIntentInput {
            kind: parse_field(&payload.kind)?,
            amount: payload.amount,
            creator_id: payload.creator_id,
            payer_id: payload.user_id,
            content_id: payload.content_id,
            subscription_tier,
            tip_message: payload.tip_message,
            description: payload.description,
            idempotency_key: payload.idempotency_key,
        })
        .await?;
    Ok(Json(created))
}

/// POST /api/payments/confirm
async fn confirm(
    State(settlement): State<Arc<SettlementUseCases>>,
    Json(payload): Json<ConfirmPayload>,
) -> AppResult<impl IntoResponse> {
    settlement
        .confirm_payment(ConfirmPaymentInput {
            payment_intent_id: payload.payment_intent_id,
            kind: parse_field(&payload.kind)?,
            amount: payload.amount,
            creator_id: payload.creator_id,
            payer_id: payload.user_id,
            content_id: payload.content_id,
            tip_message: payload.tip_message,
        })
        .await?;
    Ok(Json(json!({ "success": true })))
}
