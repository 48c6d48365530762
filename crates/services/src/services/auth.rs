use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use db::{
    DbErr, DbPool, SqlErr,
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utils_jwt::{JwtError, TokenIssuer};

use super::{
    access::Actor,
    validation::{FieldErrors, Validate},
};

const EMAIL_TAKEN: &str = "A user with this email address already exists.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    InvalidToken(#[from] JwtError),
    #[error("Token user no longer exists")]
    UnknownUser,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Validate for LoginRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["email", "password"];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Produces an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

#[derive(Clone, Debug)]
pub struct AuthService {
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(tokens: TokenIssuer) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn signup(&self, pool: &DbPool, payload: CreateUser) -> Result<User> {
        if User::find_by_email(pool, &payload.email).await?.is_some() {
            return Err(FieldErrors::single("email", EMAIL_TAKEN).into());
        }

        let password_hash = hash_password_blocking(payload.password.clone()).await?;
        let user = User::create(pool, &payload, &password_hash)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AuthError::Validation(FieldErrors::single("email", EMAIL_TAKEN))
                }
                _ => AuthError::Database(e),
            })?;

        tracing::info!(user_id = user.id, "Registered user");
        Ok(user)
    }

    pub async fn login(&self, pool: &DbPool, payload: &LoginRequest) -> Result<AccessToken> {
        let Some(credentials) = User::find_credentials_by_email(pool, &payload.email).await? else {
            tracing::debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let password = payload.password.clone();
        let password_hash = credentials.password_hash;
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .unwrap_or(false);
        if !verified {
            tracing::debug!(user_id = credentials.user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .tokens
            .issue(credentials.user.id, &credentials.user.email)?;
        Ok(AccessToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.ttl().num_seconds(),
        })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, pool: &DbPool, token: &str) -> Result<Actor> {
        let claims = self.tokens.verify(token)?;
        let user_id = claims.user_id()?;
        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        Ok(Actor {
            user_id: user.id,
            email: user.email,
        })
    }
}
