use crate::{adapters::persistence::PostgresPersistence, infra::config::AppConfig, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
pub mod dummy_gateway;
pub mod setup;
pub mod stripe_client;
pub mod stripe_payment_adapter;
pub mod webhook_signature;

pub async fn postgres_persistence(config: &AppConfig) -> anyhow::Result<PostgresPersistence> {
    let pool = init_db(config).await?;
    let persistence = PostgresPersistence::new(pool);
    Ok(persistence)
}
