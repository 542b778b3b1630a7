use std::sync::Arc;

use super::common::*;
use crate::application::use_cases::payouts::{
    ConnectAccountInput, ConnectedAccountLink, PayoutUseCases,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/connect", post(connect_account))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectPayload {
    creator_id: Uuid,
    business_type: String,
    country: String,
    email: String,
    phone: Option<String>,
}

/// POST /api/stripe/connect
async fn connect_account(
    State(payouts): State<Arc<PayoutUseCases>>,
    Json(payload): Json<ConnectPayload>,
) -> AppResult<Json<ConnectedAccountLink>> {
    let link = payouts
        .connect_creator_account(ConnectAccountInput {
            creator_id: payload.creator_id,
            business_type: payload.business_type,
            country: payload.country,
            email: payload.email,
            phone: payload.phone,
        })
        .await?;
    Ok(Json(link))
}
