use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vantage::config::Config;
use vantage::services::{PositionBoard, SessionState};
use vantage::sources::{MarginClient, QuoteClient, TradeStoreClient};
use vantage::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vantage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Vantage server on {}:{}", config.host, config.port);

    // Session-status cell shared by all collaborator clients
    let session = SessionState::new();

    // Collaborator clients
    let trade_store = TradeStoreClient::new(config.trade_store_url.clone(), session.clone());
    let quote_client = QuoteClient::new(config.quote_service_url.clone(), session.clone());
    let margin_client = MarginClient::new(config.margin_service_url.clone(), session.clone());

    // Position board: holds the latest inputs and the derived row set
    let board = PositionBoard::new(
        trade_store.clone(),
        quote_client,
        margin_client,
        session.clone(),
        config.page_size,
        config.refresh.clone(),
    );

    // Initial pass; a failure here is tolerable, polling will catch up.
    board.refresh_market_status().await;
    if let Err(e) = board.refresh_positions().await {
        warn!("initial position load failed: {}", e);
    } else {
        board.refresh_quotes().await;
        board.refresh_margins().await;
        board.refresh_exposure().await;
    }

    // Background polling loops
    board.clone().start();

    let state = AppState {
        config: config.clone(),
        session,
        trade_store,
        board,
    };

    // CORS for the browser dashboard
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = vantage::api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
