//! Email/password sessions for editors.
//!
//! Tokens look like `ss_<prefix>_<secret>`. The prefix is stored in clear and
//! used for lookup; only a SHA-256 digest of the secret is persisted, and the
//! comparison runs in constant time.

use std::sync::Arc;

use metrics::counter;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{
    CreateSessionParams, RepoError, SessionsRepo, UpsertUserParams, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::domain::types::UserRole;

const TOKEN_PREFIX: &str = "ss";
const MIN_SECRET_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;

pub const METRIC_AUTH_FAILURE: &str = "crispr_auth_failure_total";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Error)]
pub enum SessionAuthError {
    #[error("missing session")]
    Missing,
    #[error("invalid session")]
    Invalid,
    #[error("expired session")]
    Expired,
    #[error("session lacks the admin role")]
    Forbidden,
    #[error("session lookup failed")]
    Store(#[from] RepoError),
}

impl SessionAuthError {
    fn reason(&self) -> &'static str {
        match self {
            SessionAuthError::Missing => "missing",
            SessionAuthError::Invalid => "invalid",
            SessionAuthError::Expired => "expired",
            SessionAuthError::Forbidden => "forbidden",
            SessionAuthError::Store(_) => "store",
        }
    }
}

/// The account behind an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrincipal {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub prefix: String,
    pub expires_at: OffsetDateTime,
}

impl SessionPrincipal {
    pub fn require_admin(self) -> Result<Self, SessionAuthError> {
        if self.role == UserRole::Admin {
            Ok(self)
        } else {
            record_failure(&SessionAuthError::Forbidden);
            Err(SessionAuthError::Forbidden)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub token: String,
    pub principal: SessionPrincipal,
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    ttl: Duration,
    hash_cost: u32,
}

impl SessionService {
    pub fn new(users: Arc<dyn UsersRepo>, sessions: Arc<dyn SessionsRepo>, ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            ttl,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor used for new password hashes.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionIssued, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            counter!(METRIC_AUTH_FAILURE, "reason" => "unknown_user").increment(1);
            return Err(AuthError::InvalidCredentials);
        };
        let Some(hash) = user.password_hash.clone() else {
            counter!(METRIC_AUTH_FAILURE, "reason" => "no_password").increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), hash).await? {
            counter!(METRIC_AUTH_FAILURE, "reason" => "bad_password").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        let prefix = generate_prefix();
        let secret = generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let now = OffsetDateTime::now_utc();

        let session = self
            .sessions
            .create_session(CreateSessionParams {
                user_id: user.id,
                prefix,
                hashed_secret: hash_secret(&secret),
                expires_at: now + self.ttl,
            })
            .await?;

        // best-effort sweep of stale sessions; never blocks login
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            if let Err(err) = sessions.delete_expired(now).await {
                warn!(target = "crispr::auth", error = %err, "failed to purge expired sessions");
            }
        });

        info!(target = "crispr::auth", user_id = %user.id, "session opened");

        Ok(SessionIssued {
            token,
            principal: principal(&user, session.prefix, session.expires_at),
        })
    }

    pub async fn authenticate(&self, token: Option<&str>) -> Result<SessionPrincipal, SessionAuthError> {
        let result = self.resolve(token).await;
        if let Err(err) = &result {
            record_failure(err);
        }
        result
    }

    /// Drop the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let Some(parsed) = parse_token(token) else {
            return Ok(());
        };
        self.sessions.delete_by_prefix(&parsed.prefix).await?;
        Ok(())
    }

    /// Create the admin account or reset its name, password and role.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("email must be a valid address"));
        }
        if name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name must not be empty"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(
                "password must be at least 8 characters",
            ));
        }

        let password_hash = hash_password(password.to_string(), self.hash_cost).await?;
        let user = self
            .users
            .upsert_user(UpsertUserParams {
                email,
                name: name.trim().to_string(),
                password_hash,
                role: UserRole::Admin,
            })
            .await?;

        info!(target = "crispr::auth", user_id = %user.id, email = %user.email, "admin account ready");
        Ok(user)
    }

    async fn resolve(&self, token: Option<&str>) -> Result<SessionPrincipal, SessionAuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionAuthError::Missing)?;
        let parsed = parse_token(token).ok_or(SessionAuthError::Invalid)?;

        let session = self
            .sessions
            .find_by_prefix(&parsed.prefix)
            .await?
            .ok_or(SessionAuthError::Invalid)?;

        let hashed_input = hash_secret(&parsed.secret);
        if session.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(SessionAuthError::Invalid);
        }
        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(SessionAuthError::Expired);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(SessionAuthError::Invalid)?;

        Ok(principal(&user, session.prefix, session.expires_at))
    }
}

fn principal(user: &UserRecord, prefix: String, expires_at: OffsetDateTime) -> SessionPrincipal {
    SessionPrincipal {
        user_id: user.id,
        name: user.name.clone(),
        role: user.role,
        prefix,
        expires_at,
    }
}

fn record_failure(err: &SessionAuthError) {
    counter!(METRIC_AUTH_FAILURE, "reason" => err.reason()).increment(1);
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| AuthError::Hash(err.to_string()))?
        .map_err(|err| AuthError::Hash(err.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| AuthError::Hash(err.to_string()))?;
    // A malformed stored hash is a failed login, not a server error.
    Ok(outcome.unwrap_or(false))
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

fn parse_token(token: &str) -> Option<ParsedToken> {
    let mut parts = token.splitn(3, '_');
    if parts.next()? != TOKEN_PREFIX {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
        return None;
    }
    Some(ParsedToken {
        prefix: prefix.to_string(),
        secret: secret.to_string(),
    })
}
