use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

/// Which payment gateway backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentGatewayKind {
    Stripe,
    /// In-process simulation for local development.
    Dummy,
}

impl FromStr for PaymentGatewayKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" => Ok(PaymentGatewayKind::Stripe),
            "dummy" => Ok(PaymentGatewayKind::Dummy),
            other => anyhow::bail!("unknown PAYMENT_GATEWAY '{other}' (expected stripe or dummy)"),
        }
    }
}

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Base for the connect onboarding return and refresh links.
    pub app_origin: Url,
    pub payment_gateway: PaymentGatewayKind,
    /// Required when `payment_gateway` is Stripe.
    pub stripe_secret_key: Option<SecretString>,
    /// Non-empty when `payment_gateway` is Stripe. Empty means every
    /// webhook is rejected.
    pub stripe_webhook_secret: SecretString,
    pub webhook_tolerance_secs: i64,
    pub gateway_timeout: Duration,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub currency: String,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url: String = get_env("DATABASE_URL");
        let bind_addr: SocketAddr = get_env_default::<String>("BIND_ADDR", "127.0.0.1:3001".into())
            .parse()
            .context("BIND_ADDR must be a socket address")?;
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .context("CORS_ORIGIN must be a valid header value")?;
        let app_origin: Url = get_env_default("APP_ORIGIN", String::from("http://localhost:3000"))
            .parse()
            .context("APP_ORIGIN must be a valid URL")?;
        let payment_gateway: PaymentGatewayKind =
            get_env_default::<String>("PAYMENT_GATEWAY", "stripe".into()).parse()?;

        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.into()));
        if payment_gateway == PaymentGatewayKind::Stripe && stripe_secret_key.is_none() {
            anyhow::bail!("STRIPE_SECRET_KEY must be set when PAYMENT_GATEWAY=stripe");
        }
        let stripe_webhook_secret =
            webhook_secret(payment_gateway, std::env::var("STRIPE_WEBHOOK_SECRET").ok())?;

        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);
        let gateway_timeout_secs: u64 = get_env_default("GATEWAY_TIMEOUT_SECS", 15);
        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);
        let db_acquire_timeout_secs: u64 = get_env_default("DB_ACQUIRE_TIMEOUT_SECS", 5);
        let currency: String = get_env_default("CURRENCY", "usd".to_string());
        let log_file: Option<PathBuf> = std::env::var("LOG_FILE")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin,
            app_origin,
            payment_gateway,
            stripe_secret_key,
            stripe_webhook_secret,
            webhook_tolerance_secs,
            gateway_timeout: Duration::from_secs(gateway_timeout_secs),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(db_acquire_timeout_secs),
            currency: currency.to_lowercase(),
            log_file,
        })
    }
}

fn webhook_secret(gateway: PaymentGatewayKind, raw: Option<String>) -> anyhow::Result<SecretString> {
    let secret = raw.map(|s| s.trim().to_string()).unwrap_or_default();
    if secret.is_empty() && gateway == PaymentGatewayKind::Stripe {
        anyhow::bail!("STRIPE_WEBHOOK_SECRET must be set when PAYMENT_GATEWAY=stripe");
    }
    Ok(SecretString::new(secret.into()))
}
