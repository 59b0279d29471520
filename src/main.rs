//! Rolodex application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Connect to Redis
//! 3. Build shared state (token issuer, notifier)
//! 4. Build router with API routes + static file serving
//! 5. Start Axum server

use rolodex::{
    auth::middleware::AppState,
    auth::token::TokenIssuer,
    config::Config,
    notify::{LogNotifier, Notifier, SendgridNotifier},
    routes,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting rolodex on {}", config.bind_addr);

    // Connect to Redis
    let redis_client = redis::Client::open(config.redis_url.as_str()).expect("Invalid Redis URL");

    // Verify Redis connection
    let mut con = redis_client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");
    let _: String = redis::cmd("PING")
        .query_async(&mut con)
        .await
        .expect("Redis ping failed");

    // The token issuer holds the process-wide signing secret; rotating the
    // secret invalidates all outstanding tokens
    let issuer = Arc::new(TokenIssuer::new(&config.token_secret, config.token_ttl_secs));

    // Real email delivery only when an API key is configured
    let notifier: Arc<dyn Notifier> = match &config.sendgrid_api_key {
        Some(api_key) => {
            tracing::info!("Using SendGrid for verification emails");
            Arc::new(SendgridNotifier::new(
                api_key.clone(),
                config.email_from.clone(),
                config.public_base_url.clone(),
            ))
        }
        None => {
            tracing::info!("SENDGRID_API_KEY not set, logging verification emails instead");
            Arc::new(LogNotifier)
        }
    };

    // Build shared state
    let state = AppState {
        redis: redis_client,
        config: Arc::new(config.clone()),
        issuer,
        notifier,
    };

    // Build router:
    // - API routes (with state)
    // - Static file serving for the public dir, including uploaded avatars
    // - Permissive CORS: the API is consumed cross-origin
    let app = routes::api_router()
        .fallback_service(ServeDir::new("public"))
        .layer(axum::extract::DefaultBodyLimit::max(
            config.max_upload_bytes,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start server (with_connect_info required for ConnectInfo<SocketAddr> extractors)
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
