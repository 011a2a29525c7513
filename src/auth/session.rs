//! In-memory users and sessions
//!
//! Passwords are kept as salted SHA-256 digests. Session ids are random UUIDs
//! that expire after the configured lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AccessGuard, AuthError};

const MAX_USERNAME_LENGTH: usize = 64;
const MIN_PASSWORD_LENGTH: usize = 6;

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    salt: String,
    password_hash: String,
}

/// An issued session
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

// == Session Registry ==
/// Issues and validates session tokens.
#[derive(Debug)]
pub struct SessionRegistry {
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<Uuid, Session>>,
    next_user_id: AtomicI64,
    session_ttl: chrono::Duration,
}

impl SessionRegistry {
    /// Creates an empty registry whose sessions live for `session_ttl`.
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            session_ttl: chrono::Duration::from_std(session_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    /// Registers a new user.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "username must be 1 to {} characters",
                MAX_USERNAME_LENGTH
            )));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = User {
            id: self.next_user_id.fetch_add(1, Ordering::Relaxed),
            username: username.to_string(),
            password_hash: hash_password(&salt, password),
            salt,
        };
        users.insert(user.username.clone(), user.clone());

        info!(user_id = user.id, "Registered user '{}'", user.username);
        Ok(user)
    }

    /// Verifies credentials and opens a new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let user_id = {
            let users = self.users.read().await;
            let user = users
                .get(username.trim())
                .ok_or(AuthError::InvalidCredentials)?;
            if hash_password(&user.salt, password) != user.password_hash {
                return Err(AuthError::InvalidCredentials);
            }
            user.id
        };

        let now = Utc::now();
        let session = Session {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at: now + self.session_ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.is_active(now));
        sessions.insert(session.session_id, session.clone());

        debug!(user_id, "Session opened");
        Ok(session)
    }

    /// Ends the session named by `token`.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let id = parse_token(token)?;
        match self.sessions.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(AuthError::UnknownSession),
        }
    }
}

#[async_trait]
impl AccessGuard for SessionRegistry {
    async fn check(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let id = parse_token(token)?;

        match self.sessions.read().await.get(&id) {
            Some(session) if session.is_active(Utc::now()) => Ok(()),
            _ => Err(AuthError::InvalidSession),
        }
    }
}

fn parse_token(token: &str) -> Result<Uuid, AuthError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Uuid::parse_str(token).map_err(|_| AuthError::MalformedToken)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
