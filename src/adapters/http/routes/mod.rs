mod common;
pub mod connect;
pub mod creators;
pub mod payments;
pub mod payouts;
pub mod subscriptions;
pub mod webhooks;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/payments", payments::router())
        .nest("/payouts", payouts::router())
        .nest("/creators", creators::router())
        .nest("/webhooks", webhooks::router())
        .nest("/stripe", connect::router())
        .nest("/subscriptions", subscriptions::router())
}
