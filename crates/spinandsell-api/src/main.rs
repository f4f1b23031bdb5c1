//! SpinAndSell API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::services::ServeDir;

use spinandsell_api::config::AppConfig;
use spinandsell_api::error::AppError;
use spinandsell_api::state::{AppState, Providers};
use spinandsell_api::{build_router, telemetry};
use spinandsell_core::clock::SystemClock;
use spinandsell_providers::{FsDocumentStore, SmtpMailer, StripeClient};
use spinandsell_store::PgMarketplaceStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let _telemetry = telemetry::init_telemetry(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting SpinAndSell API server");
    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set; webhook deliveries will be rejected");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let providers = Providers {
        payments: Arc::new(StripeClient::new(
            config.stripe_secret_key.clone(),
            &config.stripe_api_base,
        )?),
        documents: Arc::new(FsDocumentStore::new(
            config.invoice_dir.clone(),
            &config.invoice_public_url,
        )),
        mailer: Arc::new(SmtpMailer::new(&config.smtp)?),
    };

    let app_state = AppState::new(
        Arc::new(PgMarketplaceStore::new(pool)),
        providers,
        config.checkout_settings(),
        config.webhook_settings(),
        Arc::new(SystemClock),
    );

    let app = build_router(app_state).nest_service("/invoices", ServeDir::new(&config.invoice_dir));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
