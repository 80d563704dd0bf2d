mod api;
mod config;
mod credential;
mod db;
mod ranking;
mod rate_limit;
mod score;
mod search;
mod session;
mod state;
mod validation;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use rate_limit::RateLimiter;
use state::AppState;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lux_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = db::Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    // Seed demo data on a fresh database
    db::seed::seed_demo_data(&db).expect("Failed to seed demo data");

    tracing::info!("Database initialized successfully");

    if settings.admin.token.is_none() {
        tracing::warn!("Admin token not configured; category management is disabled");
    }

    // Create application state
    let state = AppState::new(db, settings.admin.token.clone());

    // Run initial session cleanup on startup
    tracing::info!("Running initial session cleanup...");
    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) => {
            if count > 0 {
                tracing::info!("Cleaned up {} expired sessions on startup", count);
            } else {
                tracing::info!("No expired sessions to clean up");
            }
        }
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions on startup: {}", e);
        }
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600)); // Run every hour
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {}", e);
                }
            }
        }
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create global rate limiter: 100 requests per minute per session
    let rate_limiter = RateLimiter::new(100, 60);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/validate", get(api::auth::validate_session))
        // Category routes
        .route("/categories", get(api::categories::list_categories))
        .route("/categories", post(api::categories::create_category))
        .route("/categories/:id", put(api::categories::update_category))
        .route("/categories/:id", delete(api::categories::delete_category))
        .route("/categories/:id/ranking", get(api::categories::category_ranking))
        .route("/categories/:id/posts", get(api::categories::category_posts))
        // Company routes
        .route("/companies/top", get(api::companies::top_companies))
        .route("/companies/:id", get(api::companies::get_company))
        .route("/companies/:id", put(api::companies::update_company))
        // Post routes
        .route("/posts", get(api::posts::get_posts))
        .route("/posts", post(api::posts::create_post))
        .route("/posts/:id", get(api::posts::get_post))
        .route("/posts/:id", put(api::posts::update_post))
        .route("/posts/:id", delete(api::posts::delete_post))
        .route("/posts/:id/like", post(api::posts::like_post))
        .route("/posts/:id/invest", post(api::posts::invest))
        .route("/posts/:id/comments", get(api::posts::get_comments))
        .route("/posts/:id/comments", post(api::posts::create_comment))
        // Comment routes
        .route("/comments/:id", delete(api::comments::delete_comment))
        // Message routes
        .route("/messages/conversations", get(api::messages::get_conversations))
        .route(
            "/messages/conversations/:company_id",
            get(api::messages::get_conversation_with),
        )
        .route("/messages", post(api::messages::send_message))
        // Search routes
        .route("/search", get(api::search::search))
        .route("/search/combined", get(api::search::search_combined))
        .with_state(state)
        .layer(middleware::from_fn(rate_limit::rate_limit_middleware))
        .layer(axum::Extension(rate_limiter))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}

async fn health_check() -> &'static str {
    "OK"
}
