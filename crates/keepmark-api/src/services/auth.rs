//! Registration, login, and bearer tokens.
//!
//! Tokens are HS256 JWTs whose only identity claim is `id`. Passwords are
//! bcrypt-hashed on the blocking pool so hashing never stalls the runtime.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use keepmark_core::validation::{validate_login, validate_registration, Registration};
use keepmark_core::{Error, Identity, NewUser, Result, User, UserRepository};

use crate::config::AuthConfig;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const TOKEN_FAILED: &str = "Not authorized, token failed";

/// Checked against when no account matches, so unknown emails cost a full bcrypt verify.
const DECOY_PASSWORD: &str = "keepmark-decoy-password";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Identity plus a fresh token, returned by register and login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    config: Arc<AuthConfig>,
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self {
            users,
            config: Arc::new(config),
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let valid = validate_registration(&registration)?;

        if self
            .users
            .exists_by_username_or_email(&valid.username, &valid.email)
            .await?
        {
            return Err(Error::Conflict("User already exists!".to_string()));
        }

        let password_hash = hash_password(valid.password, self.config.bcrypt_cost).await?;
        let user = self
            .users
            .insert(NewUser {
                username: valid.username,
                email: valid.email,
                password_hash,
            })
            .await?;

        info!(
            subsystem = "api",
            component = "auth",
            op = "register",
            user_id = %user.id,
            "User registered"
        );
        self.session_for(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> Result<AuthSession> {
        let (email, password) = validate_login(email, password)?;

        let user = self.users.find_by_email(&email).await?;
        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.decoy_hash().await?,
        };
        let password_ok = verify_password(password, hash).await?;

        let user = match user {
            Some(user) if password_ok => user,
            Some(user) => {
                debug!(
                    subsystem = "api",
                    component = "auth",
                    op = "login",
                    user_id = %user.id,
                    "Password mismatch"
                );
                return Err(invalid_credentials());
            }
            None => {
                debug!(subsystem = "api", component = "auth", op = "login", "Unknown email");
                return Err(invalid_credentials());
            }
        };

        info!(
            subsystem = "api",
            component = "auth",
            op = "login",
            user_id = %user.id,
            "User logged in"
        );
        self.session_for(user)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user_id,
            iat: now.timestamp(),
            exp: (now + self.config.token_ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(subsystem = "api", component = "auth", error = %e, "Token rejected");
            Error::Unauthorized(TOKEN_FAILED.to_string())
        })
    }

    /// Resolve a token to the identity it names.
    ///
    /// `Ok(None)` when the token is valid but its user no longer exists.
    pub async fn identify(&self, token: &str) -> Result<Option<Identity>> {
        let claims = self.verify_token(token)?;
        Ok(self
            .users
            .find_by_id(claims.id)
            .await?
            .map(Identity::from))
    }

    /// Hashed once per service at the configured cost.
    async fn decoy_hash(&self) -> Result<String> {
        self.decoy_hash
            .get_or_try_init(|| hash_password(DECOY_PASSWORD.to_string(), self.config.bcrypt_cost))
            .await
            .cloned()
    }

    fn session_for(&self, user: User) -> Result<AuthSession> {
        let token = self.issue_token(user.id)?;
        Ok(AuthSession {
            id: user.id,
            username: user.username,
            email: user.email,
            token,
        })
    }
}

fn invalid_credentials() -> Error {
    Error::Unauthorized(INVALID_CREDENTIALS.to_string())
}

pub async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password check failed: {}", e)))
}
