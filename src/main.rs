//! ledgerd - Personal Ledger Service
//!
//! This is the main entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Store   │───▶│  Engine  │───▶│ Gateway  │
//! │  (YAML)  │    │ (PG/Mem) │    │ (Ledger) │    │  (HTTP)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Startup order matters: the system identity must exist before the
//! gateway accepts funding requests.

use std::sync::Arc;

use ledgerd::auth::AuthService;
use ledgerd::config::AppConfig;
use ledgerd::gateway::{self, state::AppState};
use ledgerd::logging::init_logging;
use ledgerd::notify::LogSink;
use ledgerd::registry::AccountRegistry;
use ledgerd::store::{LedgerStore, MemoryStore, PgStore};
use ledgerd::transfer::TransferEngine;

fn arg_value(flags: &[&str]) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if flags.contains(&arg.as_str()) {
            return args.next();
        }
    }
    None
}

fn get_env() -> String {
    arg_value(&["--env", "-e"])
        .or_else(|| std::env::var("APP_ENV").ok())
        .unwrap_or_else(|| "dev".to_string())
}

/// Port override from the command line (--port), beats the config file
fn get_port_override() -> Option<u16> {
    arg_value(&["--port"]).and_then(|raw| raw.parse().ok())
}

#[tokio::main]
async fn main() {
    let env = get_env();
    let app_config = AppConfig::load(&env);
    let _log_guard = init_logging(&app_config);

    tracing::info!("Starting ledgerd in {} mode", env);
    println!("=== ledgerd: personal ledger service ===");
    println!("   Build: {}", env!("GIT_HASH"));

    // Select storage backend
    let store: Arc<dyn LedgerStore> = match app_config.postgres_url {
        Some(ref url) => match PgStore::connect(url).await {
            Ok(pg) => {
                println!("🗄️  PostgreSQL store ready");
                Arc::new(pg)
            }
            Err(e) => {
                eprintln!("❌ FATAL: PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("⚠️  No postgres_url configured, using in-memory store (not durable)");
            Arc::new(MemoryStore::new())
        }
    };

    let auth = Arc::new(AuthService::new(
        store.clone(),
        app_config.auth.jwt_secret.clone(),
        app_config.auth.token_ttl_hours,
    ));

    // Bootstrap the system identity that sources initial funding
    let system = &app_config.auth.system;
    match auth
        .ensure_system_identity(&system.name, &system.email, &system.password)
        .await
    {
        Ok((user, account)) => {
            println!("🏦 System account ready: {} (user {})", account.id, user.user_id);
        }
        Err(e) => {
            eprintln!("❌ FATAL: System identity bootstrap failed: {}", e);
            std::process::exit(1);
        }
    }

    let registry = Arc::new(AccountRegistry::new(store.clone()));
    let engine = Arc::new(TransferEngine::new(store.clone(), Arc::new(LogSink)));
    let state = Arc::new(AppState::new(store, registry, engine, auth));

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    println!(
        "📡 Gateway will listen on {}:{}",
        app_config.gateway.host, port
    );
    gateway::run_server(port, state).await;
}
