//! Cookie-keyed sessions, login and logout.
//!
//! Every request routed through `session_middleware` gets a session; a
//! missing, unknown or expired `GITOP_SESSION` cookie yields a fresh one.
//! A session owns the picker panels opened in it, so logging out or
//! expiring disposes them.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::Account;
use crate::error::{lock_poisoned, AppError, Result};
use crate::models::{DepotId, SessionInfo};
use crate::picker::{AffinalBranchPicker, BranchSelectionListener};

pub const SESSION_COOKIE: &str = "GITOP_SESSION";

/// Oldest panels are dropped beyond this many per session.
pub const MAX_PICKERS_PER_SESSION: usize = 32;

pub struct Session {
    user: Option<String>,
    created_at: DateTime<Utc>,
    pickers: BTreeMap<u64, AffinalBranchPicker>,
    next_picker: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            user: None,
            created_at: Utc::now(),
            pickers: BTreeMap::new(),
            next_picker: 1,
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            user: self.user.clone(),
            created_at: self.created_at,
            open_pickers: self.pickers.len(),
        }
    }

    /// Create and initialize a panel; returns it for the first render.
    pub fn open_picker(
        &mut self,
        repo_id: DepotId,
        branch: Option<String>,
        listener: impl BranchSelectionListener + 'static,
    ) -> &mut AffinalBranchPicker {
        while self.pickers.len() >= MAX_PICKERS_PER_SESSION {
            if let Some((_, oldest)) = self.pickers.pop_first() {
                oldest.dispose();
            }
        }

        let seq = self.next_picker;
        self.next_picker += 1;

        let mut panel = AffinalBranchPicker::new(format!("picker{}", seq), repo_id, branch, listener);
        panel.initialize();
        self.pickers.entry(seq).or_insert(panel)
    }

    pub fn picker_mut(&mut self, markup_id: &str) -> Result<&mut AffinalBranchPicker> {
        let seq = parse_picker_id(markup_id)?;
        self.pickers
            .get_mut(&seq)
            .ok_or_else(|| AppError::PageExpired(markup_id.to_string()))
    }

    pub fn close_picker(&mut self, markup_id: &str) -> Result<()> {
        let seq = parse_picker_id(markup_id)?;
        let panel = self
            .pickers
            .remove(&seq)
            .ok_or_else(|| AppError::PageExpired(markup_id.to_string()))?;
        panel.dispose();
        Ok(())
    }

    fn dispose(self) {
        for panel in self.pickers.into_values() {
            panel.dispose();
        }
    }
}

fn parse_picker_id(markup_id: &str) -> Result<u64> {
    markup_id
        .strip_prefix("picker")
        .and_then(|seq| seq.parse().ok())
        .ok_or_else(|| AppError::PageExpired(markup_id.to_string()))
}

/// A session plus its last access time. The time lives outside the session
/// lock so expiry checks never wait on a request that holds the session.
struct SessionSlot {
    /// Milliseconds since the store's epoch.
    last_access: AtomicU64,
    session: Mutex<Session>,
}

impl SessionSlot {
    fn new(now: u64) -> Self {
        Self {
            last_access: AtomicU64::new(now),
            session: Mutex::new(Session::new()),
        }
    }
}

/// How an account proves its password.
enum Credential {
    Hash(String),
    Plain(String),
}

impl Credential {
    fn from_account(account: &Account) -> Option<Self> {
        match (&account.password_hash, &account.password) {
            (Some(phc), _) => match PasswordHash::new(phc) {
                Ok(_) => Some(Credential::Hash(phc.clone())),
                Err(e) => {
                    tracing::warn!("Ignoring account {}: bad password hash: {}", account.username, e);
                    None
                }
            },
            (None, Some(password)) => Some(Credential::Plain(password.clone())),
            (None, None) => {
                tracing::warn!("Ignoring account {}: no password", account.username);
                None
            }
        }
    }

    fn verify(&self, candidate: &str) -> bool {
        match self {
            Credential::Hash(phc) => PasswordHash::new(phc).is_ok_and(|hash| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &hash)
                    .is_ok()
            }),
            Credential::Plain(password) => password.as_bytes().ct_eq(candidate.as_bytes()).into(),
        }
    }
}

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Arc<SessionSlot>>>,
    epoch: Instant,
    timeout: Duration,
    accounts: HashMap<String, Credential>,
}

impl SessionStore {
    pub fn new(timeout: Duration, accounts: &[Account]) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            epoch: Instant::now(),
            timeout,
            accounts: accounts
                .iter()
                .filter_map(|a| Credential::from_account(a).map(|c| (a.username.clone(), c)))
                .collect(),
        }
    }

    fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn is_expired(&self, slot: &SessionSlot, now: u64) -> bool {
        let idle = now.saturating_sub(slot.last_access.load(Ordering::Relaxed));
        Duration::from_millis(idle) > self.timeout
    }

    /// Find the live session for `token`, or start a new one. Returns the
    /// session token and whether it was just created.
    pub fn touch(&self, token: Option<Uuid>) -> Result<(Uuid, bool)> {
        let now = self.now();
        let mut sessions = self.sessions.lock().map_err(lock_poisoned)?;

        if let Some(token) = token {
            if let Some(slot) = sessions.get(&token) {
                if !self.is_expired(slot, now) {
                    slot.last_access.store(now, Ordering::Relaxed);
                    return Ok((token, false));
                }
            }
            if let Some(expired) = sessions.remove(&token) {
                tracing::debug!("Session {} expired", token);
                dispose_shared(expired);
            }
        }

        let token = Uuid::new_v4();
        sessions.insert(token, Arc::new(SessionSlot::new(now)));
        Ok((token, true))
    }

    /// Run `f` against the session, holding only that session's lock.
    pub fn with_session<T>(&self, token: Uuid, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let slot = self.slot(token)?;
        let mut session = slot.session.lock().map_err(lock_poisoned)?;
        f(&mut session)
    }

    fn slot(&self, token: Uuid) -> Result<Arc<SessionSlot>> {
        let sessions = self.sessions.lock().map_err(lock_poisoned)?;
        sessions
            .get(&token)
            .cloned()
            .ok_or_else(|| AppError::PageExpired("session".to_string()))
    }

    /// Check the credentials and bind the user to the session. The session
    /// moves to a new token, which the caller must hand to the client; the
    /// old token stops working.
    pub fn login(&self, token: Uuid, username: &str, password: &str) -> Result<(Uuid, SessionInfo)> {
        let valid = self
            .accounts
            .get(username)
            .is_some_and(|credential| credential.verify(password));
        if !valid {
            tracing::warn!("Failed login for user {}", username);
            return Err(AppError::Unauthorized);
        }

        let (fresh, slot) = {
            let mut sessions = self.sessions.lock().map_err(lock_poisoned)?;
            let slot = sessions
                .remove(&token)
                .ok_or_else(|| AppError::PageExpired("session".to_string()))?;
            let fresh = Uuid::new_v4();
            sessions.insert(fresh, Arc::clone(&slot));
            (fresh, slot)
        };

        let mut session = slot.session.lock().map_err(lock_poisoned)?;
        session.user = Some(username.to_string());
        tracing::info!("User {} logged in", username);
        Ok((fresh, session.info()))
    }

    /// Drop the session and every panel it owns.
    pub fn logout(&self, token: Uuid) -> Result<()> {
        let removed = self.sessions.lock().map_err(lock_poisoned)?.remove(&token);
        if let Some(slot) = removed {
            dispose_shared(slot);
            tracing::debug!("Session {} logged out", token);
        }
        Ok(())
    }

    /// Remove sessions idle past the timeout. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.now();
        let mut sessions = self.sessions.lock().map_err(lock_poisoned)?;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, slot)| self.is_expired(slot, now))
            .map(|(token, _)| *token)
            .collect();

        for token in &expired {
            if let Some(slot) = sessions.remove(token) {
                dispose_shared(slot);
            }
        }
        Ok(expired.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

fn dispose_shared(slot: Arc<SessionSlot>) {
    // A request still holding the session disposes nothing; its panels drop
    // with the last reference.
    if let Ok(slot) = Arc::try_unwrap(slot) {
        if let Ok(session) = slot.session.into_inner() {
            session.dispose();
        }
    }
}

/// Session attached to the current request.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: Uuid,
    pub user: Option<String>,
}

pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(token: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

pub fn cleared_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Attach the request's session, creating one when needed.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let (token, created) = match state.sessions.touch(session_token(request.headers())) {
        Ok(found) => found,
        Err(e) => return e.into_response(),
    };
    let user = state
        .sessions
        .with_session(token, |session| Ok(session.user().map(str::to_string)))
        .unwrap_or(None);

    if state.app.is_development() {
        tracing::debug!(
            "{} {} session={} user={:?}",
            request.method(),
            request.uri().path(),
            token,
            user
        );
    }

    request.extensions_mut().insert(CurrentSession { token, user });
    let mut response = next.run(request).await;

    // Handlers that set their own cookie (logout) take precedence.
    if created && !response.headers().contains_key(header::SET_COOKIE) {
        if let Ok(value) = HeaderValue::from_str(&session_cookie(token)) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// Reject requests without a logged-in user unless anonymous access is on.
pub async fn require_user(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let logged_in = request
        .extensions()
        .get::<CurrentSession>()
        .is_some_and(|s| s.user.is_some());

    if state.allow_anonymous || logged_in {
        next.run(request).await
    } else {
        AppError::Unauthorized.into_response()
    }
}
