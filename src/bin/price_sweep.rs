//! Scheduled Lambda that flags stale open tasks for a price review.
//!
//! Each invocation runs one sweep and returns `{"examined": n, "flagged": m}`.

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use mockable::DefaultClock;
use serde_json::{Value, json};
use std::sync::Arc;
use taskmarket::config::{ConfigError, MarketplaceConfig};
use taskmarket::persistence::RepositoryError;
use taskmarket::persistence::postgres::PostgresMarketplace;
use taskmarket::task::services::PricePromptSweep;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Sweep = PricePromptSweep<PostgresMarketplace, DefaultClock>;

/// Errors raised while preparing or running a sweep.
#[derive(Debug, Error)]
enum SweepError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

fn build_sweep() -> Result<Sweep, SweepError> {
    let config = MarketplaceConfig::from_env()?;
    let store =
        PostgresMarketplace::connect(config.require_database_url()?, config.database_pool_size)?;
    Ok(PricePromptSweep::new(Arc::new(store), Arc::new(DefaultClock)))
}

async fn sweep_once(sweep: &Sweep) -> Result<Value, SweepError> {
    let report = sweep.run().await?;
    info!(examined = report.examined, flagged = report.flagged, "price sweep finished");
    Ok(json!({ "examined": report.examined, "flagged": report.flagged }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .init();
    let sweep = Arc::new(build_sweep()?);
    run(service_fn(move |_event: LambdaEvent<Value>| {
        let job = Arc::clone(&sweep);
        async move { sweep_once(&job).await.map_err(Error::from) }
    }))
    .await
}
