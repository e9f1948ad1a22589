use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    /// PostgreSQL connection URL; absent = volatile in-memory store
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret. `LEDGERD_JWT_SECRET` overrides the file value.
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub system: SystemIdentityConfig,
}

/// Bootstrap identity for the system user that sources initial funding
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SystemIdentityConfig {
    pub name: String,
    pub email: String,
    /// `LEDGERD_SYSTEM_PASSWORD` overrides the file value.
    pub password: String,
}

impl AppConfig {
    /// Reads `config/{env}.yaml`. A missing or malformed file aborts
    /// startup; the service never runs on guessed defaults.
    pub fn load(env: &str) -> Self {
        let path = format!("config/{env}.yaml");
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read config file {path}: {e}"));
        let mut config: AppConfig = serde_yaml::from_str(&raw)
            .unwrap_or_else(|e| panic!("invalid yaml in {path}: {e}"));
        config.apply_env_overrides();
        config
    }

    /// Secrets may come from the environment instead of the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("LEDGERD_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(password) = std::env::var("LEDGERD_SYSTEM_PASSWORD") {
            self.auth.system.password = password;
        }
        if let Ok(url) = std::env::var("LEDGERD_POSTGRES_URL") {
            self.postgres_url = Some(url);
        }
    }
}
