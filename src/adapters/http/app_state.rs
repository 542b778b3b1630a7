use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        payouts::PayoutUseCases, reconciliation::ReconciliationUseCases,
        settlement::SettlementUseCases, subscriptions::SubscriptionUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settlement_use_cases: Arc<SettlementUseCases>,
    pub reconciliation_use_cases: Arc<ReconciliationUseCases>,
    pub payout_use_cases: Arc<PayoutUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
}

impl FromRef<AppState> for Arc<SettlementUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.settlement_use_cases.clone()
    }
}

impl FromRef<AppState> for Arc<PayoutUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payout_use_cases.clone()
    }
}

impl FromRef<AppState> for Arc<SubscriptionUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.subscription_use_cases.clone()
    }
}
