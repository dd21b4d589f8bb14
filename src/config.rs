//! Environment-driven configuration.
//!
//! [`MarketplaceConfig::from_env`] reads the process environment;
//! [`MarketplaceConfig::from_lookup`] takes any lookup function so tests can
//! supply variables without touching the real environment.

use crate::payments::adapters::stripe::{StripeSettings, WebhookVerifier};
use crate::payments::domain::{FeeRate, Money, MoneyError, OnboardingUrls};
use crate::payments::services::CheckoutSettings;
use crate::task::domain::{PricingPolicy, TaskCategory};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_APP_URL: &str = "http://localhost:8081";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const DEFAULT_CURRENCY: &str = "usd";
const DEFAULT_PROCESSOR_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;
const DEFAULT_SESSION_TTL_HOURS: i64 = 720;
const DEFAULT_POOL_SIZE: u32 = 5;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable holds a value that cannot be used.
    #[error("invalid value for {variable}: {reason}")]
    Invalid {
        /// Offending variable.
        variable: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(variable: &'static str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            variable,
            reason: reason.to_string(),
        }
    }
}

/// Payment processor credentials.
#[derive(Clone)]
pub struct ProcessorConfig {
    /// Secret API key.
    pub secret_key: String,
    /// API base URL.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorConfig")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ProcessorConfig {
    /// Settings for the processor HTTP client.
    #[must_use]
    pub fn stripe_settings(&self) -> StripeSettings {
        StripeSettings {
            api_base: self.api_base.clone(),
            secret_key: self.secret_key.clone(),
            timeout: self.timeout,
        }
    }
}

/// Validated marketplace configuration.
#[derive(Clone)]
pub struct MarketplaceConfig {
    /// Fee rate and price floors.
    pub pricing: PricingPolicy,
    /// Base URL of the web frontend, used for onboarding redirects.
    pub frontend_url: String,
    /// Base URL of the app, used for checkout redirects.
    pub app_url: String,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Processor credentials, when configured.
    pub processor: Option<ProcessorConfig>,
    /// Client-side processor key, when configured.
    pub publishable_key: Option<String>,
    /// Webhook signing secret, when configured.
    pub webhook_secret: Option<String>,
    /// Accepted age of a webhook signature.
    pub webhook_tolerance: chrono::Duration,
    /// Session token signing secret, when configured.
    pub session_secret: Option<String>,
    /// Session token lifetime.
    pub session_ttl: chrono::Duration,
    /// PostgreSQL connection string, when configured.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub database_pool_size: u32,
}

impl fmt::Debug for MarketplaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketplaceConfig")
            .field("pricing", &self.pricing)
            .field("frontend_url", &self.frontend_url)
            .field("app_url", &self.app_url)
            .field("currency", &self.currency)
            .field("processor", &self.processor)
            .field("webhook_tolerance", &self.webhook_tolerance)
            .field("session_ttl", &self.session_ttl)
            .field("database_pool_size", &self.database_pool_size)
            .finish_non_exhaustive()
    }
}

struct Reader<F> {
    lookup: F,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, variable: &'static str) -> Option<String> {
        (self.lookup)(variable)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn or_default(&self, variable: &'static str, default: &str) -> String {
        self.optional(variable)
            .unwrap_or_else(|| default.to_owned())
    }

    fn parsed<T>(&self, variable: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        self.optional(variable).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|err| ConfigError::invalid(variable, err))
        })
    }

    fn money(&self, variable: &'static str, default: Money) -> Result<Money, ConfigError> {
        let Some(raw) = self.optional(variable) else {
            return Ok(default);
        };
        let amount = Money::parse_decimal(&raw)
            .map_err(|err: MoneyError| ConfigError::invalid(variable, err))?;
        if !amount.is_positive() {
            return Err(ConfigError::invalid(variable, "must be greater than zero"));
        }
        Ok(amount)
    }
}

fn base_url(variable: &'static str, raw: &str) -> Result<String, ConfigError> {
    url::Url::parse(raw).map_err(|err| ConfigError::invalid(variable, err))?;
    Ok(raw.trim_end_matches('/').to_owned())
}

impl MarketplaceConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first variable that fails to
    /// validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first variable that fails to
    /// validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Reader { lookup };

        let fee_rate = match env.optional("PLATFORM_FEE_PERCENT") {
            Some(raw) => FeeRate::parse_percent(&raw)
                .map_err(|err| ConfigError::invalid("PLATFORM_FEE_PERCENT", err))?,
            None => FeeRate::default(),
        };
        let defaults = PricingPolicy::default();
        let minimum = env.money(
            "MIN_JOB_PRICE_USD",
            defaults.minimum_for(TaskCategory::Other),
        )?;
        let emergency_minimum = env.money(
            "EMERGENCY_MIN_PRICE_USD",
            defaults.minimum_for(TaskCategory::Emergency),
        )?;

        let app_url = base_url("APP_URL", &env.or_default("APP_URL", DEFAULT_APP_URL))?;
        let frontend_url = match env.optional("FRONTEND_URL") {
            Some(raw) => base_url("FRONTEND_URL", &raw)?,
            None => app_url.clone(),
        };
        let currency = env.or_default("CURRENCY", DEFAULT_CURRENCY).to_lowercase();
        if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(ConfigError::invalid("CURRENCY", "expected a three-letter code"));
        }

        let processor = match env.optional("STRIPE_SECRET_KEY") {
            Some(secret_key) => Some(ProcessorConfig {
                secret_key,
                api_base: base_url(
                    "STRIPE_API_BASE",
                    &env.or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
                )?,
                timeout: Duration::from_secs(
                    env.parsed("PROCESSOR_TIMEOUT_SECS", DEFAULT_PROCESSOR_TIMEOUT_SECS)?,
                ),
            }),
            None => None,
        };

        let tolerance_secs: i64 =
            env.parsed("WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS)?;
        if tolerance_secs <= 0 {
            return Err(ConfigError::invalid("WEBHOOK_TOLERANCE_SECS", "must be positive"));
        }
        let ttl_hours: i64 = env.parsed("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::invalid("SESSION_TTL_HOURS", "must be positive"));
        }
        let database_pool_size: u32 = env.parsed("DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if database_pool_size == 0 {
            return Err(ConfigError::invalid("DATABASE_POOL_SIZE", "must be positive"));
        }

        Ok(Self {
            pricing: PricingPolicy::new(fee_rate, minimum, emergency_minimum),
            frontend_url,
            app_url,
            currency,
            processor,
            publishable_key: env.optional("STRIPE_PUBLISHABLE_KEY"),
            webhook_secret: env.optional("STRIPE_WEBHOOK_SECRET"),
            webhook_tolerance: chrono::Duration::seconds(tolerance_secs),
            session_secret: env.optional("SESSION_SECRET"),
            session_ttl: chrono::Duration::hours(ttl_hours),
            database_url: env.optional("DATABASE_URL"),
            database_pool_size,
        })
    }

    /// Redirect bases and currency for checkout sessions.
    #[must_use]
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings::new(&self.frontend_url, &self.app_url, &self.currency)
    }

    /// Redirect targets for hosted payee onboarding.
    #[must_use]
    pub fn onboarding_urls(&self) -> OnboardingUrls {
        OnboardingUrls {
            refresh_url: format!("{}/payee/refresh", self.frontend_url),
            return_url: format!("{}/payee/complete", self.frontend_url),
        }
    }

    /// Returns the processor credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `STRIPE_SECRET_KEY` is unset.
    pub fn require_processor(&self) -> Result<&ProcessorConfig, ConfigError> {
        self.processor
            .as_ref()
            .ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))
    }

    /// Builds the webhook verifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `STRIPE_WEBHOOK_SECRET` is unset.
    pub fn webhook_verifier(&self) -> Result<WebhookVerifier, ConfigError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or(ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;
        Ok(WebhookVerifier::new(secret.as_bytes(), self.webhook_tolerance))
    }

    /// Returns the session signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `SESSION_SECRET` is unset.
    pub fn require_session_secret(&self) -> Result<&str, ConfigError> {
        self.session_secret
            .as_deref()
            .ok_or(ConfigError::Missing("SESSION_SECRET"))
    }

    /// Returns the database connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` is unset.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}
