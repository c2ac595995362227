//! Request decoration: attach the session and the logged-in user
//!
//! Both steps leave the request untouched when their precondition fails, so
//! handlers see a missing value and render for an anonymous visitor.

use super::AppState;
use crate::session::{Session, USERNAME_KEY};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

/// Session resolved from the request's cookie
#[derive(Debug, Clone)]
pub struct RequestSession(pub Session);

/// Identity of the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub username: String,
}

/// Attach the session named by the cookie, if it resolves
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let sessions = &state.sessions;
    if sessions.has_session(request.headers()) {
        match sessions.read_session(request.headers()).await {
            Ok(session) => {
                request.extensions_mut().insert(RequestSession(session));
            }
            Err(e) => tracing::debug!("Continuing without session: {}", e),
        }
    }
    next.run(request).await
}

/// Attach the current user when the session holds a username.
///
/// Runs after [`resolve_session`].
pub async fn resolve_user(mut request: Request<Body>, next: Next) -> Response {
    let username = request
        .extensions()
        .get::<RequestSession>()
        .and_then(|RequestSession(session)| session.get_str(USERNAME_KEY))
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    if let Some(username) = username {
        request.extensions_mut().insert(CurrentUser { username });
    }
    next.run(request).await
}
