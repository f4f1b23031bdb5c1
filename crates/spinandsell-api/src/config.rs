//! Application configuration, read once at startup.

use std::path::PathBuf;
use std::str::FromStr;

use spinandsell_checkout::domain::fees::FeePolicy;
use spinandsell_checkout::domain::settings::{CheckoutSettings, DEFAULT_TAX_RATE_PERCENT};
use spinandsell_providers::SmtpSettings;
use spinandsell_providers::signature::DEFAULT_TOLERANCE_SECS;
use spinandsell_providers::stripe::DEFAULT_API_BASE;

use crate::error::AppError;
use crate::state::WebhookSettings;

/// Everything the server needs from its environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    pub webhook_tolerance_secs: i64,
    pub platform_fee_percent: u32,
    pub platform_minimum_fee: i64,
    pub tax_rate_percent: u32,
    pub currency: String,
    pub smtp: SmtpSettings,
    pub invoice_dir: PathBuf,
    pub invoice_public_url: String,
    /// OTLP collector; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let required = |key: &str| {
            var(key).ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
        };

        let base_url = var("BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_owned())
            .trim_end_matches('/')
            .to_owned();

        let smtp_user = var("SMTP_USER");
        let smtp_from = var("SMTP_FROM").unwrap_or_else(|| {
            let address = smtp_user.as_deref().unwrap_or("no-reply@spinandsell.com");
            format!("SpinAndSell <{address}>")
        });

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(&var, "PORT", 3000)?,
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: var("STRIPE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_owned()),
            webhook_tolerance_secs: parsed(
                &var,
                "STRIPE_WEBHOOK_TOLERANCE_SECS",
                DEFAULT_TOLERANCE_SECS,
            )?,
            platform_fee_percent: parsed(&var, "PLATFORM_FEE_PERCENT", 5)?,
            platform_minimum_fee: parsed(&var, "PLATFORM_MINIMUM_FEE", 50)?,
            tax_rate_percent: parsed(&var, "TAX_RATE_PERCENT", DEFAULT_TAX_RATE_PERCENT)?,
            currency: var("CURRENCY").map_or_else(|| "eur".to_owned(), |c| c.to_lowercase()),
            smtp: SmtpSettings {
                host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_owned()),
                port: parsed(&var, "SMTP_PORT", 587)?,
                username: smtp_user,
                password: var("SMTP_PASS"),
                from: smtp_from,
            },
            invoice_dir: var("INVOICE_DIR").map_or_else(|| PathBuf::from("./invoices"), PathBuf::from),
            invoice_public_url: var("INVOICE_PUBLIC_URL")
                .unwrap_or_else(|| format!("{base_url}/invoices")),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            base_url,
        })
    }

    /// Settings handed to the checkout handlers.
    #[must_use]
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            base_url: self.base_url.clone(),
            currency: self.currency.clone(),
            fees: FeePolicy {
                percent: self.platform_fee_percent,
                minimum: self.platform_minimum_fee,
            },
            tax_rate_percent: self.tax_rate_percent,
        }
    }

    /// Settings for the Stripe webhook endpoint.
    #[must_use]
    pub fn webhook_settings(&self) -> WebhookSettings {
        WebhookSettings {
            secret: self.stripe_webhook_secret.clone(),
            tolerance_secs: self.webhook_tolerance_secs,
        }
    }
}

fn parsed<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
        None => Ok(default),
    }
}
