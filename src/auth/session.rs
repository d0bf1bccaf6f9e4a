use std::collections::HashMap;
use std::sync::Mutex;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::error::AppError;

struct ActiveSession {
    email: String,
    expires_at: DateTime<Utc>,
}

/// Server-side admin sessions, keyed by the SHA-256 of the session token.
///
/// Sessions live in memory; restarting the server logs the admin out.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, ActiveSession>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session and return its bearer token.
    pub fn create(&self, email: &str) -> Result<String, AppError> {
        let bytes: [u8; 32] = rand::random();
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        let mut sessions = self.lock()?;
        let now = Utc::now();
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token_digest(&token),
            ActiveSession {
                email: email.to_string(),
                expires_at: now + self.ttl,
            },
        );
        Ok(token)
    }

    /// Resolve a token to the admin email it was issued for.
    pub fn validate(&self, token: &str) -> Result<String, AppError> {
        let digest = token_digest(token);
        let mut sessions = self.lock()?;

        match sessions.get(&digest) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.email.clone()),
            Some(_) => {
                sessions.remove(&digest);
                Err(AppError::Auth("Session expired".into()))
            }
            None => Err(AppError::Auth("Not logged in".into())),
        }
    }

    pub fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.lock()?.remove(&token_digest(token));
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ActiveSession>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("Session store lock poisoned".into()))
    }
}

fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
