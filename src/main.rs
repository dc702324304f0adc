mod api;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradelens::config::Config;
use tradelens::services::{ComprehensiveMtfService, MarketDataService};
use tradelens::sources::YahooFinanceClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mtf: Arc<ComprehensiveMtfService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, market_data: Arc<MarketDataService>) -> Self {
        let mtf = Arc::new(ComprehensiveMtfService::from_config(market_data, &config));
        Self { config, mtf }
    }
}

/// Build the HTTP application with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradelens=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!("Starting tradelens server on {}:{}", config.host, config.port);

    let yahoo = YahooFinanceClient::new(Duration::from_secs(config.market_data_timeout_secs))?;
    let market_data = Arc::new(MarketDataService::new(
        Arc::new(yahoo),
        Duration::from_secs(config.market_data_cache_ttl_secs),
    ));

    // Evict stale series once per TTL.
    {
        let market_data = market_data.clone();
        let ttl = Duration::from_secs(config.market_data_cache_ttl_secs.max(1));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(ttl).await;
                market_data.purge_expired();
            }
        });
    }

    let state = AppState::new(config.clone(), market_data);
    let app = app(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("tradelens server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
