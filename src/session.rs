use axum::http::{HeaderMap, header};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sheets.session";

/// Sessions outlive access tokens but not the day.
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    /// Absent when the user declined offline access or the provider chose
    /// not to reissue one.
    pub refresh_token: Option<String>,
    /// Expiry time as seconds since Unix epoch
    pub expires_at: i64,
}

impl TokenSet {
    /// Check if the access token is expired or about to expire (within 5 minutes)
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        self.expires_at < (now + 300)
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    tokens: TokenSet,
    expires_at: i64,
}

/// In-process token store keyed by session id. Operations on different
/// session ids never contend; same-session reads observe the latest
/// completed write.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an id for a request that arrived without one.
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Associate a token set with a session, replacing any previous one.
    /// The write is visible to every subsequent `get` once this returns;
    /// callers must await it before responding to the authorizing request.
    pub async fn store(&self, session_id: &str, tokens: TokenSet) {
        let entry = SessionEntry {
            tokens,
            expires_at: Utc::now().timestamp() + SESSION_TTL_SECS,
        };
        self.inner.write().await.insert(session_id.to_string(), entry);
    }

    /// Absence is a normal outcome: unknown and expired sessions both read
    /// as `None`. Expired entries linger until overwritten; there is no
    /// background sweeper.
    pub async fn get(&self, session_id: &str) -> Option<TokenSet> {
        let guard = self.inner.read().await;
        let entry = guard.get(session_id)?;
        if entry.expires_at <= Utc::now().timestamp() {
            return None;
        }
        Some(entry.tokens.clone())
    }

    pub async fn remove(&self, session_id: &str) {
        self.inner.write().await.remove(session_id);
    }
}

/// Pull the session id out of the request's Cookie header, if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Set-Cookie value carrying a session id back to the browser.
pub fn session_cookie(session_id: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id, SESSION_TTL_SECS
    )
}
