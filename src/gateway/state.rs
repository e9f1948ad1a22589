use std::sync::Arc;

use crate::auth::AuthService;
use crate::registry::AccountRegistry;
use crate::store::LedgerStore;
use crate::transfer::TransferEngine;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    /// Backing store (user lookups in middleware, health checks)
    pub store: Arc<dyn LedgerStore>,
    /// Account lifecycle and read-side queries
    pub registry: Arc<AccountRegistry>,
    /// Transfer posting engine
    pub engine: Arc<TransferEngine>,
    /// Identity provider
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        registry: Arc<AccountRegistry>,
        engine: Arc<TransferEngine>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            store,
            registry,
            engine,
            auth,
        }
    }
}
