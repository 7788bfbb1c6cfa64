// 🔐 Auth Provider - admin sessions and session-change subscriptions
//
// One admin account (email + SHA-256 password hash from config). Sessions are
// bearer tokens with an expiry. Listeners register explicitly and are removed
// when their Subscription is dropped.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use tracing::{info, warn};

use crate::error::StoreError;

/// Hex SHA-256 of a password, the form admin credentials are kept in.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    Expired,
}

type Listener = Arc<dyn Fn(AuthEvent, &Session) + Send + Sync>;

struct AuthInner {
    admin_email: String,
    admin_password_sha256: String,
    ttl: Duration,
    sessions: HashMap<String, Session>,
    listeners: HashMap<u64, Listener>,
    next_listener_id: u64,
}

/// Cloneable handle; all clones share sessions and listeners.
#[derive(Clone)]
pub struct AuthProvider {
    inner: Arc<RwLock<AuthInner>>,
}

/// Keeps a listener registered. Dropping it unregisters the listener.
pub struct Subscription {
    id: u64,
    inner: Weak<RwLock<AuthInner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut inner) = inner.write() {
                inner.listeners.remove(&self.id);
            }
        }
    }
}

impl AuthProvider {
    pub fn new(
        admin_email: impl Into<String>,
        admin_password_sha256: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        AuthProvider {
            inner: Arc::new(RwLock::new(AuthInner {
                admin_email: admin_email.into(),
                admin_password_sha256: admin_password_sha256.into().to_lowercase(),
                ttl,
                sessions: HashMap::new(),
                listeners: HashMap::new(),
                next_listener_id: 0,
            })),
        }
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, AuthInner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::store("auth state lock poisoned"))
    }

    /// Call listeners outside the lock so they may use the provider.
    fn notify(&self, listeners: Vec<Listener>, event: AuthEvent, session: &Session) {
        for listener in listeners {
            listener(event, session);
        }
    }

    fn listeners(inner: &AuthInner) -> Vec<Listener> {
        inner.listeners.values().cloned().collect()
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        self.sign_in_at(email, password, Utc::now())
    }

    fn sign_in_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let (session, expired, listeners) = {
            let mut inner = self.write()?;

            if !email.eq_ignore_ascii_case(&inner.admin_email)
                || hash_password(password) != inner.admin_password_sha256
            {
                warn!(email, "rejected admin sign-in");
                return Err(StoreError::AuthRequired);
            }

            let expires_at = now
                .checked_add_signed(inner.ttl)
                .ok_or_else(|| StoreError::store("session expiry out of range"))?;

            // Sessions nobody looks up again are dropped here
            let expired: Vec<Session> = inner
                .sessions
                .values()
                .filter(|s| s.is_expired_at(now))
                .cloned()
                .collect();
            inner.sessions.retain(|_, s| !s.is_expired_at(now));

            let session = Session {
                token: uuid::Uuid::new_v4().to_string(),
                email: inner.admin_email.clone(),
                created_at: now,
                expires_at,
            };
            inner.sessions.insert(session.token.clone(), session.clone());
            (session, expired, Self::listeners(&inner))
        };

        for stale in &expired {
            self.notify(listeners.clone(), AuthEvent::Expired, stale);
        }

        info!(email = %session.email, pruned = expired.len(), "admin signed in");
        self.notify(listeners, AuthEvent::SignedIn, &session);
        Ok(session)
    }

    /// Current session for `token`. Expired sessions are dropped and
    /// reported to listeners.
    pub fn session(&self, token: &str) -> Option<Session> {
        self.session_at(token, Utc::now())
    }

    fn session_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let (expired, listeners) = {
            let mut inner = self.write().ok()?;
            let session = inner.sessions.get(token)?.clone();
            if !session.is_expired_at(now) {
                return Some(session);
            }
            inner.sessions.remove(token);
            (session, Self::listeners(&inner))
        };

        info!(email = %expired.email, "admin session expired");
        self.notify(listeners, AuthEvent::Expired, &expired);
        None
    }

    pub fn sign_out(&self, token: &str) {
        let removed = match self.write() {
            Ok(mut inner) => inner
                .sessions
                .remove(token)
                .map(|session| (session, Self::listeners(&inner))),
            Err(_) => None,
        };

        if let Some((session, listeners)) = removed {
            info!(email = %session.email, "admin signed out");
            self.notify(listeners, AuthEvent::SignedOut, &session);
        }
    }

    /// The admin gate: a live session or `AuthRequired`.
    pub fn require_session(&self, token: Option<&str>) -> Result<Session, StoreError> {
        token
            .and_then(|token| self.session(token))
            .ok_or(StoreError::AuthRequired)
    }

    pub fn on_auth_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthEvent, &Session) + Send + Sync + 'static,
    {
        let id = match self.inner.write() {
            Ok(mut inner) => {
                let id = inner.next_listener_id;
                inner.next_listener_id += 1;
                inner.listeners.insert(id, Arc::new(callback));
                id
            }
            Err(_) => u64::MAX,
        };

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Live and not-yet-pruned sessions.
    pub fn session_count(&self) -> usize {
        self.inner.read().map(|inner| inner.sessions.len()).unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.read().map(|inner| inner.listeners.len()).unwrap_or(0)
    }
}
