use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use studio_api::database::manager::DatabaseManager;
use studio_api::database::models::Role;
use studio_api::handlers::{auth, categories, tags, users};
use studio_api::middleware::auth::jwt_auth_middleware;
use studio_api::middleware::check_role::check_role;
use studio_api::middleware::validate_user::validate_user_middleware;
use studio_api::services::UserService;

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ADMIN_OR_EDITOR: &[Role] = &[Role::Admin, Role::Editor];

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = studio_api::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Studio API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; token issuance and verification will fail");
    }

    // The database is allowed to be absent at startup: /health reports
    // degraded and the pool connects lazily once it appears
    match DatabaseManager::migrate().await {
        Ok(()) => match UserService::new().await {
            Ok(service) => {
                if let Err(e) = service.bootstrap_admin().await {
                    tracing::warn!("Admin bootstrap failed: {}", e);
                }
            }
            Err(e) => tracing::warn!("Skipping admin bootstrap: {}", e),
        },
        Err(e) => tracing::warn!("Skipping migrations, database unavailable: {}", e),
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("STUDIO_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Studio API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Authenticated session management
        .merge(auth_session_routes())
        // Role-gated administration
        .merge(user_routes())
        .merge(taxonomy_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

fn auth_session_routes() -> Router {
    Router::new()
        .route("/auth/logout", post(auth::logout_post))
        .route("/auth/logout-all", post(auth::logout_all_post))
        .route("/auth/profile", get(auth::profile_get).put(auth::profile_put))
        .layer(from_fn(validate_user_middleware))
        .layer(from_fn(jwt_auth_middleware))
}

fn user_routes() -> Router {
    Router::new()
        .route("/api/users", get(users::index).post(users::store))
        .route("/api/users/statistics", get(users::statistics))
        .route("/api/users/bulk-delete", post(users::bulk_delete))
        .route("/api/users/bulk-update-status", post(users::bulk_update_status))
        .route(
            "/api/users/:id",
            get(users::show).put(users::update).delete(users::destroy),
        )
        .route("/api/users/:id/restore", post(users::restore))
        .route("/api/users/:id/force", delete(users::force_destroy))
        .route("/api/users/:id/toggle-status", post(users::toggle_status))
        .route("/api/users/:id/role", put(users::change_role))
        .layer(from_fn(|req: Request, next: Next| check_role(ADMIN_ONLY, req, next)))
        .layer(from_fn(validate_user_middleware))
        .layer(from_fn(jwt_auth_middleware))
}

fn taxonomy_routes() -> Router {
    Router::new()
        .route("/api/categories", get(categories::index).post(categories::store))
        .route("/api/categories/reorder", put(categories::reorder))
        .route(
            "/api/categories/:id",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
        .route("/api/categories/:id/toggle-status", post(categories::toggle_status))
        .route("/api/tags", get(tags::index).post(tags::store))
        .route(
            "/api/tags/:id",
            get(tags::show).put(tags::update).delete(tags::destroy),
        )
        .layer(from_fn(|req: Request, next: Next| check_role(ADMIN_OR_EDITOR, req, next)))
        .layer(from_fn(validate_user_middleware))
        .layer(from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "status": 200,
        "message": "Studio API",
        "data": {
            "name": "Studio API",
            "version": version,
            "description": "Staff console backend - user administration, sessions, and taxonomy",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login, /auth/refresh (public - token acquisition)",
                "session": "/auth/logout, /auth/logout-all, /auth/profile (access token)",
                "users": "/api/users (ADMIN)",
                "categories": "/api/categories (ADMIN, EDITOR)",
                "tags": "/api/tags (ADMIN, EDITOR)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": 200,
                "message": "ok",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "status": 503,
                    "error": "SERVICE_UNAVAILABLE",
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
