//! Per-browser session storage.
//!
//! Each browser gets a random id in the `ei_session` cookie. The id points at
//! a small string map holding the bearer token and the signed-in user, the
//! same two keys a browser client would keep in local storage. The whole map
//! is written to disk after every change.

use crate::errors::AppError;
use crate::models::{LoginResponse, User};
use crate::storage::{load_sessions, persist_sessions};
use axum::http::{header::COOKIE, HeaderMap};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "ei_session";
pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_DATA_KEY: &str = "user_data";
pub const CHAT_HISTORY_KEY: &str = "chat_history";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionData {
    pub sessions: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    data: Arc<Mutex<SessionData>>,
}

impl SessionStore {
    pub fn new(path: PathBuf, data: SessionData) -> Self {
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn open(path: &Path) -> Self {
        let data = load_sessions(path).await;
        info!(
            "loaded {} session(s) from {}",
            data.sessions.len(),
            path.display()
        );
        Self::new(path.to_path_buf(), data)
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub async fn get(&self, session_id: &str, key: &str) -> Option<String> {
        let data = self.data.lock().await;
        data.sessions
            .get(session_id)
            .and_then(|values| values.get(key))
            .cloned()
    }

    pub async fn token(&self, session_id: &str) -> Option<String> {
        self.get(session_id, AUTH_TOKEN_KEY)
            .await
            .filter(|token| !token.is_empty())
    }

    pub async fn user(&self, session_id: &str) -> Option<User> {
        let raw = self.get(session_id, USER_DATA_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!("discarding unreadable user data for session: {err}");
                None
            }
        }
    }

    /// Applies `edit` to a copy of the data and keeps the copy only once it
    /// is on disk. `edit` returns false when nothing changed.
    async fn commit<F>(&self, edit: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut SessionData) -> Result<bool, AppError>,
    {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        if !edit(&mut next)? {
            return Ok(());
        }
        persist_sessions(&self.path, &next).await?;
        *data = next;
        Ok(())
    }

    pub async fn set(&self, session_id: &str, key: &str, value: String) -> Result<(), AppError> {
        self.commit(|data| {
            data.sessions
                .entry(session_id.to_string())
                .or_default()
                .insert(key.to_string(), value);
            Ok(true)
        })
        .await
    }

    /// Rewrites one key from its current value while holding the store lock,
    /// so concurrent read-modify-write cycles on a session do not interleave.
    pub async fn update<F>(&self, session_id: &str, key: &str, rewrite: F) -> Result<(), AppError>
    where
        F: FnOnce(Option<&str>) -> Result<String, AppError>,
    {
        self.commit(|data| {
            let values = data.sessions.entry(session_id.to_string()).or_default();
            let next = rewrite(values.get(key).map(String::as_str))?;
            values.insert(key.to_string(), next);
            Ok(true)
        })
        .await
    }

    pub async fn sign_in(&self, session_id: &str, login: &LoginResponse) -> Result<(), AppError> {
        let user = serde_json::to_string(&login.user).map_err(AppError::internal)?;
        self.commit(|data| {
            let values = data.sessions.entry(session_id.to_string()).or_default();
            values.insert(AUTH_TOKEN_KEY.to_string(), login.token.clone());
            values.insert(USER_DATA_KEY.to_string(), user);
            Ok(true)
        })
        .await
    }

    /// Drops every key of the session.
    pub async fn clear(&self, session_id: &str) -> Result<(), AppError> {
        self.commit(|data| Ok(data.sessions.remove(session_id).is_some()))
            .await
    }
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
