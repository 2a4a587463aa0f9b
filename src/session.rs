//! Cookie sessions and flash messages.
//!
//! The store maps opaque hex tokens to per-browser state: at most one
//! signed-in username and at most one pending flash message. Handlers
//! never mutate the store directly; they work through a request-scoped
//! [`SessionContext`] that snapshots the incoming state and queues
//! outgoing mutations, applied under one lock at response time.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use parking_lot::Mutex;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "quillpad_session";

/// Token byte length before hex encoding (32 bytes = 64 hex chars).
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot session-scoped notice, consumed by the next full page render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    username: Option<String>,
    flash: Option<Flash>,
    expires_at: Instant,
}

/// Queued session mutation, applied at response time.
#[derive(Debug, Clone)]
enum SessionOp {
    SignIn(String),
    SignOut,
    SetFlash(Flash),
    TakeFlash,
}

/// In-process session store, keyed by cookie token.
pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh session and return its token. Expired entries are
    /// swept here, so the map stays bounded by active browsers.
    pub fn create(&self) -> String {
        let token = generate_token();
        let now = Instant::now();

        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            token.clone(),
            SessionEntry {
                username: None,
                flash: None,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Immutable view of a live session; drops the entry when expired.
    fn snapshot(&self, token: &str) -> Option<(Option<String>, Option<Flash>)> {
        let mut entries = self.entries.lock();
        match entries.get(token) {
            Some(entry) if entry.expires_at > Instant::now() => {
                Some((entry.username.clone(), entry.flash.clone()))
            }
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }

    /// Apply queued mutations in order under a single lock. A session
    /// that expired mid-request is recreated so the response's cookie
    /// still points at consistent state.
    fn apply(&self, token: &str, ops: &[SessionOp]) {
        if ops.is_empty() {
            return;
        }
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(token.to_string())
            .or_insert_with(|| SessionEntry {
                username: None,
                flash: None,
                expires_at: now + self.ttl,
            });

        for op in ops {
            match op {
                SessionOp::SignIn(username) => entry.username = Some(username.clone()),
                SessionOp::SignOut => entry.username = None,
                SessionOp::SetFlash(flash) => entry.flash = Some(flash.clone()),
                SessionOp::TakeFlash => entry.flash = None,
            }
        }
    }
}

/// Request-scoped session view: immutable incoming snapshot plus an
/// outgoing mutation list.
pub struct SessionContext {
    store: Arc<SessionStore>,
    token: String,
    fresh: bool,
    username: Option<String>,
    flash: Option<Flash>,
    ops: Vec<SessionOp>,
}

impl SessionContext {
    /// Build the context from the request's cookie jar, minting a new
    /// session when the cookie is absent, stale, or unknown.
    pub fn load(store: &Arc<SessionStore>, jar: &CookieJar) -> Self {
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            if let Some((username, flash)) = store.snapshot(cookie.value()) {
                return Self {
                    store: Arc::clone(store),
                    token: cookie.value().to_string(),
                    fresh: false,
                    username,
                    flash,
                    ops: Vec::new(),
                };
            }
        }
        Self {
            store: Arc::clone(store),
            token: store.create(),
            fresh: true,
            username: None,
            flash: None,
            ops: Vec::new(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn signed_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn sign_in(&mut self, username: &str) {
        self.username = Some(username.to_string());
        self.ops.push(SessionOp::SignIn(username.to_string()));
    }

    pub fn sign_out(&mut self) {
        self.username = None;
        self.ops.push(SessionOp::SignOut);
    }

    pub fn set_flash(&mut self, flash: Flash) {
        self.ops.push(SessionOp::SetFlash(flash));
    }

    /// Read-and-clear: returns the pending flash and queues its removal.
    /// Called exactly by the full-page renderers.
    pub fn take_flash(&mut self) -> Option<Flash> {
        let flash = self.flash.take();
        if flash.is_some() {
            self.ops.push(SessionOp::TakeFlash);
        }
        flash
    }

    /// Commit queued mutations and return the jar, adding the session
    /// cookie when this request minted one.
    pub fn finish(self, jar: CookieJar) -> CookieJar {
        self.store.apply(&self.token, &self.ops);
        if self.fresh {
            let cookie = Cookie::build((SESSION_COOKIE, self.token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            jar.add(cookie)
        } else {
            jar
        }
    }
}

/// Generate a random session token (hex-encoded).
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_ttl(secs: u64) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Duration::from_secs(secs)))
    }

    fn jar_for(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.to_string()))
    }

    #[test]
    fn fresh_context_has_no_user_and_sets_cookie() {
        let store = store_with_ttl(60);
        let ctx = SessionContext::load(&store, &CookieJar::new());

        assert!(!ctx.signed_in());
        let jar = ctx.finish(CookieJar::new());
        assert!(jar.get(SESSION_COOKIE).is_some());
    }

    #[test]
    fn sign_in_persists_across_requests() {
        let store = store_with_ttl(60);

        let mut ctx = SessionContext::load(&store, &CookieJar::new());
        ctx.sign_in("admin");
        let jar = ctx.finish(CookieJar::new());
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();

        let ctx = SessionContext::load(&store, &jar_for(&token));
        assert_eq!(ctx.username(), Some("admin"));
    }

    #[test]
    fn sign_out_clears_the_user() {
        let store = store_with_ttl(60);

        let mut ctx = SessionContext::load(&store, &CookieJar::new());
        ctx.sign_in("admin");
        let jar = ctx.finish(CookieJar::new());
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();

        let mut ctx = SessionContext::load(&store, &jar_for(&token));
        ctx.sign_out();
        ctx.finish(jar_for(&token));

        let ctx = SessionContext::load(&store, &jar_for(&token));
        assert!(!ctx.signed_in());
    }

    #[test]
    fn flash_is_read_once() {
        let store = store_with_ttl(60);

        let mut ctx = SessionContext::load(&store, &CookieJar::new());
        ctx.set_flash(Flash::success("It worked."));
        let jar = ctx.finish(CookieJar::new());
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();

        let mut ctx = SessionContext::load(&store, &jar_for(&token));
        let flash = ctx.take_flash().unwrap();
        assert_eq!(flash.kind, FlashKind::Success);
        assert_eq!(flash.message, "It worked.");
        ctx.finish(jar_for(&token));

        let mut ctx = SessionContext::load(&store, &jar_for(&token));
        assert!(ctx.take_flash().is_none());
    }

    #[test]
    fn untaken_flash_survives_a_request() {
        let store = store_with_ttl(60);

        let mut ctx = SessionContext::load(&store, &CookieJar::new());
        ctx.set_flash(Flash::error("Pending."));
        let jar = ctx.finish(CookieJar::new());
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();

        // A request that renders no full page (e.g. a raw document) does
        // not consume the flash.
        let ctx = SessionContext::load(&store, &jar_for(&token));
        ctx.finish(jar_for(&token));

        let mut ctx = SessionContext::load(&store, &jar_for(&token));
        assert_eq!(ctx.take_flash(), Some(Flash::error("Pending.")));
    }

    #[test]
    fn expired_session_is_replaced() {
        let store = store_with_ttl(0);

        let mut ctx = SessionContext::load(&store, &CookieJar::new());
        ctx.sign_in("admin");
        let jar = ctx.finish(CookieJar::new());
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();

        let ctx = SessionContext::load(&store, &jar_for(&token));
        assert!(!ctx.signed_in(), "expired session must not authenticate");
    }

    #[test]
    fn unknown_token_gets_a_fresh_session() {
        let store = store_with_ttl(60);

        let ctx = SessionContext::load(&store, &jar_for("deadbeef"));
        assert!(!ctx.signed_in());
        let jar = ctx.finish(CookieJar::new());
        let minted = jar.get(SESSION_COOKIE).unwrap().value().to_string();
        assert_ne!(minted, "deadbeef");
    }

    #[test]
    fn tokens_are_unique_and_hex() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), TOKEN_BYTES * 2);
        assert!(t1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
