//! Accounts and tokens: Argon2id password hashes, HS256 access tokens, and
//! single-slot refresh and reset tokens held in the key-value store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use argon2::{
    Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use deskline_db::{Database, StoreError};
use deskline_kv::KeyValueStore;
use deskline_types::api::AuthResponse;
use deskline_types::auth::{AccessClaims, PurposeClaims, TokenKind, TokenPair};
use deskline_types::models::UserProfile;

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const EMAIL_TAKEN: &str = "User already exists with this email";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH: &str = "Invalid refresh token";
const INVALID_RESET: &str = "Invalid or expired reset token";
const INACTIVE_USER: &str = "User not found or inactive";

fn refresh_key(user_id: Uuid) -> String {
    format!("refresh_token:{user_id}")
}

fn reset_key(user_id: Uuid) -> String {
    format!("reset_token:{user_id}")
}

/// `now + ttl` as a JWT `exp`, or an error when it does not fit.
fn expires_at(now: i64, ttl: Duration) -> Result<i64, AuthError> {
    i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| AuthError::Internal(anyhow!("token lifetime {ttl:?} is out of range")))
}

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub hash: HashParams,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct SessionService {
    db: Arc<Database>,
    kv: Arc<dyn KeyValueStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    hasher: Argon2<'static>,
}

impl SessionService {
    pub fn new(
        db: Arc<Database>,
        kv: Arc<dyn KeyValueStore>,
        config: &SessionConfig,
    ) -> anyhow::Result<Self> {
        let params = Params::new(
            config.hash.memory_kib,
            config.hash.iterations,
            config.hash.parallelism,
            None,
        )
        .map_err(|e| anyhow!("invalid password hash parameters: {e}"))?;
        expires_at(Utc::now().timestamp(), config.access_ttl)
            .map_err(|_| anyhow!("access token lifetime {:?} is too large", config.access_ttl))?;

        Ok(Self {
            db,
            kv,
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: config.access_ttl,
            hasher: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, AuthError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict(EMAIL_TAKEN));
        }

        let password_hash = self.hash_password(password)?;
        let (email_owned, name_owned) = (email.to_string(), name.to_string());
        let user = deskline_db::blocking(&self.db, move |db| {
            db.create_user(&email_owned, &password_hash, &name_owned)
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::Conflict(EMAIL_TAKEN),
            other => other.into(),
        })?;

        let tokens = self.issue_tokens(user.id, &user.email).await?;
        info!("User registered successfully: {}", email);
        Ok(AuthResponse {
            user: user.profile(),
            tokens,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::Unauthorized(INVALID_CREDENTIALS))?;

        if !user.is_active {
            return Err(AuthError::Unauthorized("Account is disabled"));
        }
        if !self.verify_password(password, &user.password) {
            warn!("Failed login for {}", email);
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        }

        let tokens = self.issue_tokens(user.id, &user.email).await?;
        info!("User logged in successfully: {}", email);
        Ok(AuthResponse {
            user: user.profile(),
            tokens,
        })
    }

    /// Mint an access/refresh pair. The refresh token replaces whatever was
    /// stored for this user, so earlier refresh tokens stop working.
    pub async fn issue_tokens(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();

        let access_token = self.sign(&AccessClaims {
            sub: user_id,
            email: email.to_string(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: expires_at(now, self.access_ttl)?,
        })?;
        let refresh_token = self.sign(&PurposeClaims {
            sub: user_id,
            kind: TokenKind::Refresh,
            jti: Uuid::new_v4(),
            iat: now,
            exp: expires_at(now, REFRESH_TOKEN_TTL)?,
        })?;

        self.kv
            .set(&refresh_key(user_id), &refresh_token, Some(REFRESH_TOKEN_TTL))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .decode_purpose(refresh_token, TokenKind::Refresh)
            .ok_or(AuthError::Unauthorized(INVALID_REFRESH))?;

        // Consumed atomically, so one token yields at most one new pair.
        if !self.kv.take_if_eq(&refresh_key(claims.sub), refresh_token).await? {
            warn!("Superseded or unknown refresh token for user {}", claims.sub);
            return Err(AuthError::Unauthorized(INVALID_REFRESH));
        }

        let user = self
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthorized(INACTIVE_USER))?;

        let tokens = self.issue_tokens(user.id, &user.email).await?;
        info!("Token refreshed for user: {}", user.email);
        Ok(tokens)
    }

    /// Forget the user's refresh token. Safe to call repeatedly.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.kv.delete(&refresh_key(user_id)).await?;
        info!("User logged out: {}", user_id);
        Ok(())
    }

    /// Store a one-hour reset token for `email` and hand it back for
    /// delivery. Unknown addresses yield `None`; callers must not reveal
    /// which case occurred.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.find_by_email(email).await? else {
            info!("Password reset requested for non-existent email: {}", email);
            return Ok(None);
        };

        let now = Utc::now().timestamp();
        let token = self.sign(&PurposeClaims {
            sub: user.id,
            kind: TokenKind::PasswordReset,
            jti: Uuid::new_v4(),
            iat: now,
            exp: expires_at(now, RESET_TOKEN_TTL)?,
        })?;

        self.kv
            .set(&reset_key(user.id), &token, Some(RESET_TOKEN_TTL))
            .await?;

        info!("Password reset requested for: {}", email);
        Ok(Some(token))
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let claims = self
            .decode_purpose(token, TokenKind::PasswordReset)
            .ok_or(AuthError::Unauthorized(INVALID_RESET))?;

        if !self.kv.take_if_eq(&reset_key(claims.sub), token).await? {
            return Err(AuthError::Unauthorized(INVALID_RESET));
        }

        let password_hash = self.hash_password(new_password)?;
        let user_id = claims.sub;
        deskline_db::blocking(&self.db, move |db| {
            db.update_user_password(user_id, &password_hash)
        })
        .await?;

        info!("Password reset successfully for user: {}", user_id);
        Ok(())
    }

    /// Resolve an access token to the active user it was issued for.
    pub async fn verify(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let claims = decode::<AccessClaims>(access_token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::Unauthorized("Invalid or expired token"))?
            .claims;

        let user = self
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthorized(INACTIVE_USER))?;

        Ok(user.profile())
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(e.into()))
    }

    fn decode_purpose(&self, token: &str, kind: TokenKind) -> Option<PurposeClaims> {
        decode::<PurposeClaims>(token, &self.decoding, &Validation::default())
            .ok()
            .map(|data| data.claims)
            .filter(|claims| claims.kind == kind)
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(anyhow!("password hashing failed: {e}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .and_then(|parsed| self.hasher.verify_password(password.as_bytes(), &parsed))
            .is_ok()
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<deskline_db::models::UserRow>, StoreError> {
        let email = email.to_string();
        deskline_db::blocking(&self.db, move |db| db.get_user_by_email(&email)).await
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<deskline_db::models::UserRow>, StoreError> {
        deskline_db::blocking(&self.db, move |db| db.get_user_by_id(id)).await
    }
}
