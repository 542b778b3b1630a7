use std::sync::Arc;

use super::common::*;
use crate::application::use_cases::{
    ledger::SubscriptionProfile, subscriptions::SubscriptionUseCases,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/reactivate", post(reactivate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriberPayload {
    user_id: Uuid,
}

/// POST /api/subscriptions/{id}/cancel
async fn cancel(
    State(subscriptions): State<Arc<SubscriptionUseCases>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubscriberPayload>,
) -> AppResult<Json<SubscriptionProfile>> {
    Ok(Json(subscriptions.cancel(id, payload.user_id).await?))
}

/// POST /api/subscriptions/{id}/reactivate
async fn reactivate(
    State(subscriptions): State<Arc<SubscriptionUseCases>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubscriberPayload>,
) -> AppResult<Json<SubscriptionProfile>> {
    Ok(Json(subscriptions.reactivate(id, payload.user_id).await?))
}
