use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::payment_gateway::PaymentGatewayPort,
        use_cases::{
            notifications::Notifier,
            payouts::PayoutUseCases,
            reconciliation::ReconciliationUseCases,
            settlement::SettlementUseCases,
            subscriptions::SubscriptionUseCases,
        },
    },
    infra::{
        config::{AppConfig, PaymentGatewayKind},
        dummy_gateway::DummyGateway,
        postgres_persistence,
        stripe_payment_adapter::StripeGateway,
    },
};
use anyhow::Context;
use std::{fs::File, path::Path, sync::Arc};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentGatewayPort>> {
    match config.payment_gateway {
        PaymentGatewayKind::Stripe => {
            let key = config
                .stripe_secret_key
                .clone()
                .context("STRIPE_SECRET_KEY must be set when PAYMENT_GATEWAY=stripe")?;
            Ok(Arc::new(StripeGateway::new(key, config.gateway_timeout)?))
        }
        PaymentGatewayKind::Dummy => {
            tracing::warn!("Using the in-process dummy payment gateway");
            Ok(Arc::new(DummyGateway::new()))
        }
    }
}

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let postgres_arc = Arc::new(postgres_persistence(&config).await?);
    let gateway = init_gateway(&config)?;

    let settlement_use_cases = Arc::new(SettlementUseCases::new(
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        gateway.clone(),
        postgres_arc.clone() as Arc<dyn Notifier>,
        config.currency.clone(),
    ));

    let reconciliation_use_cases = ReconciliationUseCases::new(
        settlement_use_cases.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
    );

    let payout_use_cases = PayoutUseCases::new(
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        gateway,
        config.currency.clone(),
        config.app_origin.clone(),
    );

    let subscription_use_cases = SubscriptionUseCases::new(postgres_arc);

    Ok(AppState {
        config: Arc::new(config),
        settlement_use_cases,
        reconciliation_use_cases: Arc::new(reconciliation_use_cases),
        payout_use_cases: Arc::new(payout_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
    })
}

pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "creatorpay=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs)
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
    Ok(())
}
