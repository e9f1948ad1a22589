//! OpenAPI document and Swagger UI wiring
//!
//! The generated document is served at `/api-docs/openapi.json`; the
//! interactive UI lives under `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

// Schema types referenced from handler annotations
use crate::account::{Account, AccountStatus};
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::gateway::handlers::health::HealthResponse;
use crate::gateway::types::{BalanceData, SystemFundingRequest, TransactionRequest};
use crate::transfer::{Transfer, TransferKind, TransferStatus};

/// Bearer JWT authentication security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT issued by /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// Top-level API document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ledgerd API",
        version = "1.0.0",
        description = "Personal ledger backend: accounts, double-entry transfers, idempotent retries.",
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        // Public endpoints
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::auth::register,
        crate::gateway::handlers::auth::login,
        crate::gateway::handlers::auth::logout,
        // Authenticated endpoints
        crate::gateway::handlers::accounts::open_account,
        crate::gateway::handlers::accounts::list_accounts,
        crate::gateway::handlers::accounts::account_balance,
        crate::gateway::handlers::accounts::close_account,
        crate::gateway::handlers::accounts::resolve_recipient,
        crate::gateway::handlers::transactions::create_transaction,
        // System credential only
        crate::gateway::handlers::transactions::create_initial_funds,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            Account,
            AccountStatus,
            BalanceData,
            TransactionRequest,
            SystemFundingRequest,
            Transfer,
            TransferStatus,
            TransferKind,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login (no auth required)"),
        (name = "Accounts", description = "Account lifecycle and balance queries (auth required)"),
        (name = "Transactions", description = "Fund transfers with idempotent retries (auth required)"),
        (name = "System", description = "Health checks and system funding")
    )
)]
pub struct ApiDoc;
