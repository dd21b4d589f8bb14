//! Lambda entry point serving the marketplace JSON API.
//!
//! Reads configuration from the environment, connects the `PostgreSQL`
//! store and the Stripe-compatible processor, then serves requests until the
//! runtime shuts down. `RUST_LOG` controls log verbosity (default `info`).

use lambda_http::{Error, Request, run, service_fn};
use mockable::DefaultClock;
use std::sync::Arc;
use taskmarket::api::ApiHandler;
use taskmarket::app::{Marketplace, MarketplaceSettings};
use taskmarket::config::{ConfigError, MarketplaceConfig};
use taskmarket::identity::adapters::LoggingOtpNotifier;
use taskmarket::identity::ports::NotifierError;
use taskmarket::payments::adapters::stripe::StripeClient;
use taskmarket::payments::ports::PaymentProcessorError;
use taskmarket::persistence::RepositoryError;
use taskmarket::persistence::postgres::PostgresMarketplace;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "Taskmarket";

type Handler = ApiHandler<PostgresMarketplace, StripeClient, LoggingOtpNotifier, DefaultClock>;

/// Errors that stop the service before it can serve requests.
#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database setup failed: {0}")]
    Database(#[source] RepositoryError),
    #[error("payment processor setup failed: {0}")]
    Processor(#[source] PaymentProcessorError),
    #[error("notifier setup failed: {0}")]
    Notifier(#[source] NotifierError),
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();
}

fn build_handler() -> Result<Handler, StartupError> {
    let config = MarketplaceConfig::from_env()?;
    let settings = MarketplaceSettings::from_config(&config)?;
    let verifier = config.webhook_verifier()?;
    let store = PostgresMarketplace::connect(config.require_database_url()?, config.database_pool_size)
        .map_err(StartupError::Database)?;
    let processor = StripeClient::new(config.require_processor()?.stripe_settings())
        .map_err(StartupError::Processor)?;
    let notifier = LoggingOtpNotifier::new(APP_NAME).map_err(StartupError::Notifier)?;
    let clock = Arc::new(DefaultClock);

    let marketplace = Marketplace::new(
        Arc::new(store),
        Arc::new(processor),
        Arc::new(notifier),
        Arc::clone(&clock),
        settings,
    );
    info!(app_url = %config.app_url, "marketplace api configured");
    let handler = ApiHandler::new(Arc::new(marketplace), verifier, clock);
    Ok(match config.publishable_key {
        Some(key) => handler.with_publishable_key(key),
        None => {
            warn!("STRIPE_PUBLISHABLE_KEY unset; processor config endpoint disabled");
            handler
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let handler = Arc::new(build_handler()?);
    run(service_fn(move |request: Request| {
        let api = Arc::clone(&handler);
        async move { api.handle(&request).await }
    }))
    .await
}
