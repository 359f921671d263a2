//! Cookie-backed server-side sessions.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → SessionStore::load (known id → snapshot, otherwise fresh id)
//!     → RequestContext.session (handlers read/write the snapshot)
//!     → SessionStore::save (new or rotated id) / SessionStore::update (existing id)
//!     → Set-Cookie when the id is new or rotated
//! ```
//!
//! # Design Decisions
//! - Only ids issued by this store are honored (no session fixation)
//! - Snapshots are plain data; no lock is held while handlers run
//! - A snapshot is written back only if the request changed it, and never
//!   re-creates a session removed while the request was in flight
//! - Idle sessions are swept periodically

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::SessionConfig;

/// Per-visitor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Option<u64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    /// Path to return to after a successful login.
    pub redirect_after_login: Option<String>,
    /// One-shot error shown on the login form.
    pub login_error: Option<String>,
    /// One-shot error shown on the registration form.
    pub register_error: Option<String>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Record a logged-in user.
    pub fn log_in(&mut self, user_id: u64, username: &str, display_name: String) {
        self.user_id = Some(user_id);
        self.username = Some(username.to_string());
        self.display_name = Some(display_name);
    }
}

struct SessionEntry {
    data: SessionData,
    last_seen: Instant,
}

/// A loaded session.
#[derive(Debug)]
pub struct LoadedSession {
    pub id: String,
    pub data: SessionData,
    /// True when the id was minted for this request.
    pub is_new: bool,
}

/// In-memory session table.
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    cookie_name: String,
    secure_cookie: bool,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_name: config.cookie_name.clone(),
            secure_cookie: config.secure_cookie,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    /// Mint a new session id.
    pub fn new_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Load the session named by the request cookies, or start a new one.
    pub fn load(&self, headers: &HeaderMap) -> LoadedSession {
        if let Some(id) = self.cookie_value(headers) {
            if let Some(mut entry) = self.sessions.get_mut(&id) {
                entry.last_seen = Instant::now();
                return LoadedSession {
                    data: entry.data.clone(),
                    id,
                    is_new: false,
                };
            }
        }

        LoadedSession {
            id: Self::new_id(),
            data: SessionData::default(),
            is_new: true,
        }
    }

    /// Store a session under a freshly minted id.
    pub fn save(&self, id: &str, data: SessionData) {
        self.sessions.insert(
            id.to_string(),
            SessionEntry {
                data,
                last_seen: Instant::now(),
            },
        );
    }

    /// Write back a request's snapshot of an existing session.
    ///
    /// `loaded` is the snapshot the request started from; the entry is only
    /// replaced when `data` differs from it. Returns false when the session
    /// no longer exists (logged out or swept meanwhile).
    pub fn update(&self, id: &str, loaded: &SessionData, data: SessionData) -> bool {
        let Some(mut entry) = self.sessions.get_mut(id) else {
            return false;
        };
        if data != *loaded {
            entry.data = data;
        }
        entry.last_seen = Instant::now();
        true
    }

    pub fn remove(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than the configured timeout.
    ///
    /// Returns the removed ids so dependent state (carts) can be cleared.
    pub fn purge_idle(&self) -> Vec<String> {
        self.purge_idle_since(Instant::now())
    }

    fn purge_idle_since(&self, now: Instant) -> Vec<String> {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| now.saturating_duration_since(entry.last_seen) > self.idle_timeout)
            .map(|entry| entry.key().clone())
            .collect();

        for id in &expired {
            self.sessions.remove(id);
        }
        expired
    }

    /// `Set-Cookie` value for `id`.
    pub fn cookie_header(&self, id: &str) -> String {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", self.cookie_name, id);
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn cookie_value(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.to_string())
    }
}
