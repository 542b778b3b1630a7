use std::sync::Arc;

use super::common::*;
use crate::application::use_cases::payouts::{EarningsSnapshot, PayoutUseCases};

pub fn router() -> Router<AppState> {
    Router::new().route("/{creator_id}/earnings", get(earnings))
}

/// GET /api/creators/{creator_id}/earnings
async fn earnings(
    State(payouts): State<Arc<PayoutUseCases>>,
    Path(creator_id): Path<Uuid>,
) -> AppResult<Json<EarningsSnapshot>> {
    Ok(Json(payouts.get_creator_earnings(creator_id).await?))
}
