use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware::from_fn,
    response::{Json, Redirect},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use config::AppConfig;
use database::connection::get_db_client;
use services::betsapi_client::BetsApiClient;
use services::match_store::MongoMatchStore;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("🔧 Configuration loaded: {}", config.get_config_info());

    let db = get_db_client(&config).await?;
    let store = MongoMatchStore::new(&db);
    if let Err(e) = store.ensure_indexes().await {
        tracing::warn!("Failed to ensure indexes: {}", e);
    }

    let upstream = BetsApiClient::new(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app_state = AppState::new(config, Arc::new(upstream), Arc::new(store));
    let app = build_router(app_state);

    tracing::info!("🚀 Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

fn build_router(app_state: AppState) -> Router {
    let admin = Router::new()
        .route("/", get(admin_index))
        .fallback_service(ServeDir::new(&app_state.config.admin_web_path));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .nest("/api/v1/enhanced-football", routes::enhanced_football::routes())
        .nest("/admin", admin)
        .layer(from_fn(middleware::error_envelope::error_envelope))
        .layer(cors_layer(&app_state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root_handler() -> &'static str {
    "⚽ MatchNow football data API"
}

async fn admin_index() -> Redirect {
    Redirect::temporary("/admin/pages/index.html")
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
