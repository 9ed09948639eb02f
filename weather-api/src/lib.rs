pub mod api;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod model;
pub mod notifier;
pub mod service;

#[cfg(test)]
mod testutils;

use crate::api::ApiService;
use crate::config::StoreConfig;
use crate::errors::WeatherApiError;
use crate::notifier::Notifier;
use crate::service::WeatherService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use store::{DocumentStore, MemoryStore};

/// Serves the API and admin listeners until either fails.
pub async fn run(config: config::Config) -> Result<(), WeatherApiError> {
    config.validate()?;

    let store: Arc<dyn DocumentStore> = match config.store {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
    };
    let notifier = Notifier::new(&config.notifier)?;
    let weather = WeatherService::new(store, notifier).await?;

    tracing::info!(
        listener = %config.listener.address(),
        admin_listener = %config.admin_listener.address(),
        "Starting weather API"
    );

    let api_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        ApiService::new(weather),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, WeatherApiError>::new(|| true),
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
