//! Careline entry-point: loads settings, prepares storage, and serves the API.

mod migrations;
mod server;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use careline::inbound::http::health::HealthState;
use careline::outbound::persistence::{DbPool, PoolConfig};
use careline::outbound::tokens::secret_fingerprint;
use server::settings::{BuildMode, ServerSettings};
use server::{ServerConfig, create_server};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = color_eyre::install() {
        warn!(error = %e, "color-eyre install failed");
    }
    init_tracing();

    let settings = ServerSettings::load_from_process()
        .and_then(|loaded| loaded.resolve(BuildMode::from_debug_assertions()))
        .map_err(std::io::Error::other)?;

    if settings.jwt_secret_is_default {
        warn!("CARELINE_JWT_SECRET not set; using the development secret (debug builds only)");
    }
    info!(
        jwt_secret_fingerprint = %secret_fingerprint(&settings.jwt_secret),
        free_tier_monthly_limit = settings.free_tier_monthly_limit,
        "settings loaded"
    );
    match settings.ai_rate_limit {
        Some(limit) => info!(
            burst = limit.burst.get(),
            replenish_secs = limit.replenish_every.as_secs(),
            "per-client AI rate limit enabled"
        ),
        None => warn!("per-client AI rate limit disabled"),
    }

    let database_url = settings.database_url.clone();
    let mut config = ServerConfig::from_settings(settings);
    if let Some(url) = database_url {
        migrations::run_pending(url.clone())
            .await
            .map_err(std::io::Error::other)?;
        let pool = DbPool::new(PoolConfig::new(url.as_str()))
            .await
            .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    info!(bind_addr = %config.bind_addr(), "starting HTTP server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
