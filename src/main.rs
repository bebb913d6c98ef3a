use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use trellis_api::dispatch::{self, AppState};
use trellis_api::middleware::identity_middleware;
use trellis_api::resource::RegistryError;
use trellis_api::resources;
use trellis_api::store::{self, MemStore};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up JWT_SECRET, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    let config = trellis_api::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("starting trellis-api in {:?} mode", config.environment);

    let app = app()
        .await
        .unwrap_or_else(|e| panic!("failed to build resource registry: {}", e));

    // Allow tests or deployments to override port via env
    let port = std::env::var("TRELLIS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("trellis-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

async fn app() -> Result<Router, RegistryError> {
    let store = Arc::new(MemStore::new());
    store::seed_demo(&store).await;
    let registry = resources::build_registry(store)?;

    Ok(Router::new()
        // Service banner and liveness
        .route("/", get(root))
        .route("/health", get(health))
        // Everything else is resolved against the resource registry
        .fallback(dispatch::handle)
        // Global middleware
        .layer(axum::middleware::from_fn(identity_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            registry: Arc::new(registry),
        }))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "data": {
            "name": "Trellis API",
            "version": version,
            "description": "Hierarchical resource dispatch built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "accounts": "/accounts[/:account_id] (read open)",
                "widgets": "/accounts/:account_id/widgets[/:widget_id] (requires account grants)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
