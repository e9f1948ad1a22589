pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{jwt_auth_middleware, require_system};
use state::AppState;

/// Start HTTP Gateway server
pub async fn run_server(port: u16, state: Arc<AppState>) {
    // ==========================================================================
    // Auth Routes (public; logout reads the bearer token itself so a
    // missing or expired token still logs out cleanly)
    // ==========================================================================
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    // ==========================================================================
    // Account Routes - Protected by JWT
    // ==========================================================================
    let account_routes = Router::new()
        .route("/", post(handlers::accounts::open_account))
        .route("/", get(handlers::accounts::list_accounts))
        .route("/{id}/balance", get(handlers::accounts::account_balance))
        .route("/{id}", delete(handlers::accounts::close_account))
        .route(
            "/resolve/{email}",
            get(handlers::accounts::resolve_recipient),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // ==========================================================================
    // Transaction Routes - Protected by JWT; the system-funding route
    // additionally requires the system credential
    // ==========================================================================
    let transaction_routes = Router::new()
        .route("/", post(handlers::transactions::create_transaction))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .merge(
            Router::new()
                .route(
                    "/system/initial-funds",
                    post(handlers::transactions::create_initial_funds),
                )
                // jwt runs first (outermost layer is the one added last)
                .layer(from_fn(require_system))
                .layer(from_fn_with_state(state.clone(), jwt_auth_middleware)),
        );

    // Swagger UI is stateless; merged after with_state
    let app = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/accounts", account_routes)
        .nest("/api/transactions", transaction_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()));

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ FATAL: cannot bind {bind_addr}: {e}");
            eprintln!("   Is another instance holding port {port}? (lsof -i :{port})");
            std::process::exit(1);
        }
    };

    println!("🚀 Gateway listening on http://{bind_addr}");
    println!("📖 API Docs: http://{bind_addr}/docs");
    println!("📂 Public API:  /api/auth/*, /api/health");
    println!("🔒 Private API: /api/accounts/*, /api/transactions/* (JWT required)");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ FATAL: server stopped: {e}");
        std::process::exit(1);
    }
}
