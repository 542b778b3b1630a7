//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires every use case to one `InMemoryLedger`, a
//! `DummyGateway` and a `RecordingNotifier`.

use std::{sync::Arc, time::Duration};

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        ledger::{ContentItem, CreatorProfile, PaymentIntentProfile, PayoutProfile, SubscriptionProfile},
        notifications::Notifier,
        payouts::PayoutUseCases,
        reconciliation::ReconciliationUseCases,
        settlement::SettlementUseCases,
        subscriptions::SubscriptionUseCases,
    },
    infra::{
        config::{AppConfig, PaymentGatewayKind},
        dummy_gateway::{DummyGateway, DummyScenario},
    },
    test_utils::{InMemoryLedger, RecordingNotifier},
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/creatorpay_test".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        payment_gateway: PaymentGatewayKind::Dummy,
        stripe_secret_key: None,
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        webhook_tolerance_secs: 300,
        gateway_timeout: Duration::from_secs(5),
        db_max_connections: 1,
        db_acquire_timeout: Duration::from_secs(1),
        currency: "usd".to_string(),
        log_file: None,
    }
}

/// Settlement use cases over the in-memory ledger.
pub fn build_settlement_use_cases(
    ledger: Arc<InMemoryLedger>,
    gateway: Arc<DummyGateway>,
    notifier: Arc<dyn Notifier>,
) -> SettlementUseCases {
    SettlementUseCases::new(
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        ledger,
        gateway,
        notifier,
        "usd".to_string(),
    )
}

/// Builder for an `AppState` backed by in-memory mocks.
///
/// ```ignore
/// let creator = create_test_creator(|c| c.total_earnings = 10_000);
/// let (app_state, ledger, gateway) = TestAppStateBuilder::new()
///     .with_creator(creator)
///     .build_with_mocks();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    creators: Vec<CreatorProfile>,
    content: Vec<ContentItem>,
    intents: Vec<PaymentIntentProfile>,
    subscriptions: Vec<SubscriptionProfile>,
    payouts: Vec<PayoutProfile>,
    scenario: DummyScenario,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creator(mut self, creator: CreatorProfile) -> Self {
        self.creators.push(creator);
        self
    }

    pub fn with_content(mut self, item: ContentItem) -> Self {
        self.content.push(item);
        self
    }

    pub fn with_intent(mut self, intent: PaymentIntentProfile) -> Self {
        self.intents.push(intent);
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionProfile) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_payout(mut self, payout: PayoutProfile) -> Self {
        self.payouts.push(payout);
        self
    }

    pub fn with_scenario(mut self, scenario: DummyScenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Also returns the ledger and gateway so tests can inspect them.
    pub fn build_with_mocks(self) -> (AppState, Arc<InMemoryLedger>, Arc<DummyGateway>) {
        let mut ledger = InMemoryLedger::new();
        for creator in self.creators {
            ledger = ledger.with_creator(creator);
        }
        for payout in self.payouts {
            ledger = ledger.with_payout(payout);
        }
        let ledger = Arc::new(ledger);
        for item in self.content {
            ledger.insert_content(item);
        }
        for intent in self.intents {
            ledger.insert_intent(intent);
        }
        for subscription in self.subscriptions {
            ledger.insert_subscription(subscription);
        }

        let gateway = Arc::new(DummyGateway::with_scenario(self.scenario));
        let config = test_config();

        let settlement_use_cases = Arc::new(build_settlement_use_cases(
            ledger.clone(),
            gateway.clone(),
            Arc::new(RecordingNotifier::new()),
        ));
        let reconciliation_use_cases = ReconciliationUseCases::new(
            settlement_use_cases.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
        );
        let payout_use_cases = PayoutUseCases::new(
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            gateway.clone(),
            config.currency.clone(),
            config.app_origin.clone(),
        );
        let subscription_use_cases = SubscriptionUseCases::new(ledger.clone());

        let app_state = AppState {
            config: Arc::new(config),
            settlement_use_cases,
            reconciliation_use_cases: Arc::new(reconciliation_use_cases),
            payout_use_cases: Arc::new(payout_use_cases),
            subscription_use_cases: Arc::new(subscription_use_cases),
        };
        (app_state, ledger, gateway)
    }
}
