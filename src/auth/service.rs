//! Identity provider: registration, login, token verification
//!
//! Thin collaborator around the ledger core. Resolves `(user_id,
//! is_system)` for incoming requests and owns the system identity
//! bootstrap. Password hashing stays here; nothing else in the crate
//! sees a password or a hash.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::account::Account;
use crate::core_types::UserId;
use crate::error::LedgerError;
use crate::store::{LedgerStore, NewUser, StoreError, UserRecord};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// User Registration Request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Alice Example")]
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[schema(example = "alice@example.com")]
    #[validate(email)]
    pub email: String,
    #[schema(example = "password123")]
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// User Login Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Auth Response (JWT)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

pub struct AuthService {
    store: Arc<dyn LedgerStore>,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(store: Arc<dyn LedgerStore>, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            store,
            jwt_secret,
            token_ttl_hours,
        }
    }

    /// Register a new user and issue a token
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, LedgerError> {
        req.validate()
            .map_err(|e| LedgerError::InvalidRequest(e.to_string()))?;

        let password_hash = Self::hash_password(&req.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                email: req.email,
                name: req.name,
                password_hash,
                is_system: false,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateKey => {
                    LedgerError::InvalidRequest("email already registered".to_string())
                }
                other => other.into(),
            })?;

        info!(user_id = user.user_id, "User registered");
        let token = self.issue_token(user.user_id)?;
        Ok(AuthResponse {
            token,
            user_id: user.user_id,
            name: user.name,
            email: user.email,
        })
    }

    /// Login user and issue JWT
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, LedgerError> {
        // Unknown email and wrong password answer identically
        let user = self
            .store
            .user_by_email(&req.email)
            .await?
            .ok_or(LedgerError::Unauthorized)?;

        let parsed_hash =
            PasswordHash::new(&user.password_hash).map_err(|_| LedgerError::Unauthorized)?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| LedgerError::Unauthorized)?;

        let token = self.issue_token(user.user_id)?;
        Ok(AuthResponse {
            token,
            user_id: user.user_id,
            name: user.name,
            email: user.email,
        })
    }

    /// Issue a signed token for the user
    pub fn issue_token(&self, user_id: UserId) -> Result<String, LedgerError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| LedgerError::Persistence(format!("token signing failed: {}", e)))
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, LedgerError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|_| LedgerError::Unauthorized)?;
        Ok(token_data.claims)
    }

    /// Revoke the presented token.
    ///
    /// The raw token goes on a store-backed denylist consulted by the
    /// auth middleware. Entries are kept for `token_ttl_hours`, the
    /// longest any issued token can still be live. Safe to call twice
    /// with the same token.
    pub async fn logout(&self, token: &str) -> Result<(), LedgerError> {
        let expires_at = Utc::now() + Duration::hours(self.token_ttl_hours);
        self.store.revoke_token(token, expires_at).await?;
        info!("Token revoked");
        Ok(())
    }

    /// Ensure the configured system user and its ACTIVE account exist.
    ///
    /// Idempotent: safe to run on every startup. The system account is
    /// the source of all system-funding transfers.
    pub async fn ensure_system_identity(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, Account), LedgerError> {
        if let Some(user) = self.store.user_by_email(email).await? {
            if !user.is_system {
                return Err(LedgerError::InvalidRequest(
                    "configured system email belongs to a regular user".to_string(),
                ));
            }
            let accounts = self.store.accounts_for_owner(user.user_id).await?;
            if let Some(account) = accounts.into_iter().find(Account::is_active) {
                return Ok((user, account));
            }
            let account = Account::open(user.user_id);
            self.store.insert_account(&account).await?;
            info!(account_id = %account.id, "Opened replacement system account");
            return Ok((user, account));
        }

        let password_hash = Self::hash_password(password)?;
        let user = self
            .store
            .insert_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password_hash,
                is_system: true,
            })
            .await?;
        let account = Account::open(user.user_id);
        self.store.insert_account(&account).await?;

        info!(
            user_id = user.user_id,
            account_id = %account.id,
            "System identity bootstrapped"
        );
        Ok((user, account))
    }

    fn hash_password(password: &str) -> Result<String, LedgerError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| LedgerError::Persistence(format!("password hashing failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AuthService {
        let store = Arc::new(MemoryStore::new());
        AuthService::new(store as Arc<dyn LedgerStore>, "test-secret".to_string(), 24)
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let registered = auth.register(register_req("alice@test.io")).await.unwrap();
        assert!(!registered.token.is_empty());

        let session = auth
            .login(LoginRequest {
                email: "alice@test.io".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.user_id, registered.user_id);

        let claims = auth.verify_token(&session.token).unwrap();
        assert_eq!(claims.sub, registered.user_id.to_string());
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let auth = service();
        auth.register(register_req("alice@test.io")).await.unwrap();

        let err = auth
            .login(LoginRequest {
                email: "alice@test.io".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized));

        let err = auth
            .login(LoginRequest {
                email: "nobody@test.io".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let auth = service();
        auth.register(register_req("alice@test.io")).await.unwrap();
        let err = auth.register(register_req("alice@test.io")).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let auth = service();

        let err = auth
            .register(RegisterRequest {
                name: "Alice".to_string(),
                email: "not-an-email".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));

        let err = auth
            .register(RegisterRequest {
                name: "Alice".to_string(),
                email: "alice@test.io".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let auth = service();
        let session = auth.register(register_req("alice@test.io")).await.unwrap();

        let mut tampered = session.token.clone();
        tampered.push('x');
        assert!(auth.verify_token(&tampered).is_err());

        let other = AuthService::new(
            Arc::new(MemoryStore::new()) as Arc<dyn LedgerStore>,
            "different-secret".to_string(),
            24,
        );
        assert!(other.verify_token(&session.token).is_err());
    }

    #[tokio::test]
    async fn test_logout_puts_token_on_denylist() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(
            store.clone() as Arc<dyn LedgerStore>,
            "test-secret".to_string(),
            24,
        );

        let session = auth.register(register_req("alice@test.io")).await.unwrap();
        assert!(!store.is_token_revoked(&session.token).await.unwrap());

        auth.logout(&session.token).await.unwrap();
        assert!(store.is_token_revoked(&session.token).await.unwrap());

        // Second logout with the same token is a no-op
        auth.logout(&session.token).await.unwrap();
        assert!(store.is_token_revoked(&session.token).await.unwrap());

        // Revocation is a denylist decision; the signature itself stays
        // valid, and the middleware is what refuses the token
        assert!(auth.verify_token(&session.token).is_ok());
    }

    #[tokio::test]
    async fn test_system_bootstrap_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(
            store.clone() as Arc<dyn LedgerStore>,
            "test-secret".to_string(),
            24,
        );

        let (first_user, first_account) = auth
            .ensure_system_identity("system", "system@ledgerd", "system-password")
            .await
            .unwrap();
        assert!(first_user.is_system);

        let (second_user, second_account) = auth
            .ensure_system_identity("system", "system@ledgerd", "system-password")
            .await
            .unwrap();
        assert_eq!(second_user.user_id, first_user.user_id);
        assert_eq!(second_account.id, first_account.id);

        let accounts = store.accounts_for_owner(first_user.user_id).await.unwrap();
        assert_eq!(accounts.len(), 1);
    }
}
