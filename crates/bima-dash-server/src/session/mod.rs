// SPDX-License-Identifier: Apache-2.0

mod tokens;

pub use tokens::{LoadToken, LoadTokens};

use crate::config::LoginCredentials;
use axum::http::HeaderMap;
use bima_dash_model::{Contract, WeatherLookup};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

pub const SESSION_COOKIE: &str = "bima_session";

/// Authentication flag of one browser session.
#[derive(Debug, Default)]
pub struct AuthContext {
    authenticated: AtomicBool,
}

impl AuthContext {
    /// Sets the flag when the pair matches the configured login.
    pub fn login(&self, credentials: &LoginCredentials, username: &str, password: &str) -> bool {
        let ok = credentials.accepts(username, password);
        if ok {
            self.authenticated.store(true, Ordering::Relaxed);
        }
        ok
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }

    pub fn logout(&self) {
        self.authenticated.store(false, Ordering::Relaxed);
    }
}

/// Contract collection as last fetched for this session.
#[derive(Debug, Default)]
pub struct ListState {
    pub contracts: Vec<Contract>,
    pub last_fetched: Option<DateTime<Utc>>,
    pub loaded: bool,
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub auth: AuthContext,
    pub list: Mutex<ListState>,
    /// Per-contract precipitation, filled once per contract.
    pub weather: Mutex<HashMap<String, WeatherLookup>>,
    pub tokens: LoadTokens,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Unauthenticated session with a fresh random id. It is not tracked
    /// until handed to [`SessionStore::insert`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: new_session_id(),
            auth: AuthContext::default(),
            list: Mutex::new(ListState::default()),
            weather: Mutex::new(HashMap::new()),
            tokens: LoadTokens::new(),
        }
    }
}

#[derive(Debug)]
struct SessionEntry {
    session: Arc<Session>,
    last_seen: Instant,
}

/// In-memory session table. Idle sessions expire after `idle_ttl`; past
/// `max_sessions` the least recently seen one is evicted.
#[derive(Debug)]
pub struct SessionStore {
    idle_ttl: Duration,
    max_sessions: usize,
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            idle_ttl,
            max_sessions,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Live session for `id`. A hit refreshes its idle clock.
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let mut entries = self.entries.write().await;
        self.expire_idle(&mut entries);
        let entry = entries.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Tracks `session`, or refreshes it when it is already known.
    pub async fn insert(&self, session: Arc<Session>) {
        let mut entries = self.entries.write().await;
        self.expire_idle(&mut entries);
        if !entries.contains_key(&session.id) && entries.len() >= self.max_sessions {
            if let Some(victim) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(k, _)| k.clone())
            {
                debug!("evicting least recently seen session");
                entries.remove(&victim);
            }
        }
        entries.insert(
            session.id.clone(),
            SessionEntry {
                session,
                last_seen: Instant::now(),
            },
        );
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.entries.write().await.remove(id).map(|e| e.session)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Session named by the request cookie, if it is still known.
    pub async fn from_headers(&self, headers: &HeaderMap) -> Option<Arc<Session>> {
        let id = session_id_from_headers(headers)?;
        self.get(&id).await
    }

    fn expire_idle(&self, entries: &mut HashMap<String, SessionEntry>) {
        let ttl = self.idle_ttl;
        entries.retain(|_, e| e.last_seen.elapsed() <= ttl);
    }
}

fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[must_use]
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

#[must_use]
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
