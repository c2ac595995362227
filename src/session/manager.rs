//! Session manager: the request-facing side of the session layer.
//!
//! Reads the session cookie from incoming requests, resolves it through the
//! provider, and issues a fresh cookie when no usable session exists.

use super::{Session, SessionProvider};
use crate::config::SessionConfig;
use crate::error::{CoreError, Result};
use axum::http::{header::COOKIE, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE as BASE64_URL, Engine};
use cookie::Cookie;
use rand::Rng;

/// Issues and validates session cookies.
///
/// Construct once at startup and share it through the application state.
#[derive(Debug)]
pub struct SessionManager {
    cookie_name: String,
    max_age: time::Duration,
    provider: SessionProvider,
}

impl SessionManager {
    pub fn new(
        cookie_name: impl Into<String>,
        max_age_secs: i64,
        provider: SessionProvider,
    ) -> Self {
        SessionManager {
            cookie_name: cookie_name.into(),
            max_age: time::Duration::seconds(max_age_secs),
            provider,
        }
    }

    pub fn from_config(config: &SessionConfig, provider: SessionProvider) -> Self {
        Self::new(config.cookie_name.clone(), config.max_age_secs, provider)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn provider(&self) -> &SessionProvider {
        &self.provider
    }

    /// True if the request carries a non-empty session cookie.
    ///
    /// Does not check that the session still exists in the store.
    pub fn has_session(&self, headers: &HeaderMap) -> bool {
        self.cookie_value(headers).is_some_and(|v| !v.is_empty())
    }

    /// Resolve the session named by the request's cookie
    pub async fn read_session(&self, headers: &HeaderMap) -> Result<Session> {
        let sid = self.session_id_from(headers)?;
        self.provider.read_session(&sid).await
    }

    /// Resume the request's session, or start a new one.
    ///
    /// Any failure to resume (no cookie, unknown ID, store error) creates a
    /// new session. The cookie is returned only for a new session and must
    /// be sent back as `Set-Cookie`.
    ///
    /// When a session ID is presented, its lock in the provider's table is
    /// held until the session is resumed or replaced and its cookie issued.
    pub async fn start_session(&self, headers: &HeaderMap) -> (Session, Option<Cookie<'static>>) {
        let presented = self.session_id_from(headers).ok();
        let _guard = match &presented {
            Some(sid) => Some(self.provider.locks().lock(sid).await),
            None => None,
        };

        if let Some(sid) = &presented {
            match self.provider.read_session(sid).await {
                Ok(session) => return (session, None),
                Err(e) => tracing::debug!("Could not resume session, starting a new one: {}", e),
            }
        }

        let (session, cookie) = self.create_session().await;
        (session, Some(cookie))
    }

    async fn create_session(&self) -> (Session, Cookie<'static>) {
        let sid = generate_session_id();
        let session = self.provider.initialize_session(sid.clone());

        // Store the empty document so the cookie resolves before any key is set
        if let Err(e) = self.provider.update_session(&session).await {
            tracing::warn!("Failed to persist new session: {}", e);
        }

        tracing::debug!("Issued new session cookie");
        (session, self.session_cookie(&sid))
    }

    fn session_cookie(&self, sid: &str) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), urlencoding::encode(sid).into_owned()))
            .path("/")
            .http_only(true)
            .max_age(self.max_age)
            .build()
    }

    /// Raw value of the first cookie with our name
    fn cookie_value(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(|cookie| cookie.ok())
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Unescaped session ID. Missing, empty or undecodable cookies are NotFound.
    fn session_id_from(&self, headers: &HeaderMap) -> Result<String> {
        let not_found = || CoreError::NotFound("Session cookie", self.cookie_name.clone());

        let value = self
            .cookie_value(headers)
            .filter(|v| !v.is_empty())
            .ok_or_else(not_found)?;

        urlencoding::decode(&value)
            .map(|sid| sid.into_owned())
            .map_err(|_| not_found())
    }
}

/// New random session ID: 256 bits, URL-safe base64
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    BASE64_URL.encode(bytes)
}
