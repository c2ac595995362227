//! Page handlers

use super::middleware::CurrentUser;
use super::AppState;
use crate::catalogue::{Miniature, MiniatureSet};
use crate::session::USERNAME_KEY;
use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::Serialize;

// ============================================================================
// Shared page plumbing
// ============================================================================

/// Fields every page passes to the main layout
#[derive(Debug, Serialize)]
struct Layout {
    page_title: String,
    user: Option<CurrentUser>,
}

impl Layout {
    fn new(page_title: impl Into<String>, user: Option<Extension<CurrentUser>>) -> Self {
        Layout {
            page_title: page_title.into(),
            user: user.map(|Extension(user)| user),
        }
    }
}

fn render<T: Serialize>(state: &AppState, template: &str, page: &T) -> Response {
    match state.templates.render(template, page) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render {}: {}", template, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

/// Blank or whitespace-only values display as "-"
fn empty_to_dash(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Link to a miniature page. The ID is percent-encoded, so the URL needs no HTML escaping.
fn miniature_url(id: &str) -> String {
    format!("/miniature/{}", urlencoding::encode(id))
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ============================================================================
// Home
// ============================================================================

#[derive(Debug, Serialize)]
struct HomePage<'a> {
    #[serde(flatten)]
    layout: Layout,
    sets: &'a [MiniatureSet],
}

pub async fn home(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let page = HomePage {
        layout: Layout::new("", user),
        sets: state.catalogue.sets(),
    };
    render(&state, "home.html", &page)
}

// ============================================================================
// Login
// ============================================================================

/// Start a session and, when `?username=` names a known user, log them in.
///
/// Always redirects home.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let (mut session, issued) = state.sessions.start_session(&headers).await;

    let mut usernames = params
        .iter()
        .filter(|(key, _)| key == "username")
        .map(|(_, value)| value.trim());

    match (usernames.next(), usernames.next()) {
        (Some(username), None) => match state.db.get_user(username).await {
            Ok(user) => match session.set(USERNAME_KEY, user.username.as_str()).await {
                Ok(()) => tracing::info!("User {} logged in", user.username),
                Err(e) => tracing::error!("Failed to store login for {}: {}", user.username, e),
            },
            Err(e) if e.is_not_found() => tracing::info!("Login refused: {}", e),
            Err(e) => tracing::error!("Failed to look up user {}: {}", username, e),
        },
        _ => tracing::debug!("Login without a single username parameter"),
    }

    let mut response = Redirect::to("/").into_response();
    if let Some(cookie) = issued {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Session cookie is not a valid header: {}", e),
        }
    }
    response
}

// ============================================================================
// Miniature detail
// ============================================================================

#[derive(Debug, Serialize)]
struct MiniatureDetailPage {
    #[serde(flatten)]
    layout: Layout,
    id: String,
    name: String,
    lineage: String,
    aspect: String,
    spawn_cost: String,
    aspect_cost: String,
    power: String,
    defense: String,
    life: String,
    abilities: String,
    flavor_text: String,
    collector_number: String,
    rarity: String,
    set_code: Option<String>,
    set: String,
    next_url: Option<String>,
    prev_url: Option<String>,
}

impl MiniatureDetailPage {
    fn new(
        mini: &Miniature,
        set: Option<&MiniatureSet>,
        user: Option<Extension<CurrentUser>>,
    ) -> Self {
        MiniatureDetailPage {
            layout: Layout::new(mini.name(), user),
            id: mini.id().to_string(),
            name: mini.name().to_string(),
            lineage: empty_to_dash(mini.lineage()),
            aspect: empty_to_dash(mini.aspect()),
            spawn_cost: empty_to_dash(mini.spawn_cost()),
            aspect_cost: empty_to_dash(mini.aspect_cost()),
            power: empty_to_dash(mini.power()),
            defense: empty_to_dash(mini.defense()),
            life: empty_to_dash(mini.life()),
            abilities: empty_to_dash(mini.abilities()),
            flavor_text: empty_to_dash(mini.flavor_text()),
            collector_number: empty_to_dash(mini.collector_number()),
            rarity: empty_to_dash(mini.rarity()),
            set_code: set.map(|s| s.code().to_string()),
            set: set.map_or_else(|| "Unknown".to_string(), |s| s.name().to_string()),
            next_url: mini.next_id().map(miniature_url),
            prev_url: mini.prev_id().map(miniature_url),
        }
    }
}

pub async fn miniature_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(mini) = state.catalogue.miniature(&id) else {
        return not_found();
    };

    let page = MiniatureDetailPage::new(mini, state.catalogue.set_of(mini), user);
    render(&state, "miniDetail.html", &page)
}

// ============================================================================
// Set detail
// ============================================================================

#[derive(Debug, Serialize)]
struct SetDetailPage<'a> {
    #[serde(flatten)]
    layout: Layout,
    name: &'a str,
    miniatures: Vec<&'a Miniature>,
}

pub async fn set_detail(
    State(state): State<AppState>,
    Path(code): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(set) = state.catalogue.set(&code) else {
        return not_found();
    };

    let page = SetDetailPage {
        layout: Layout::new(format!("{} Set", set.name()), user),
        name: set.name(),
        miniatures: state
            .catalogue
            .miniatures_in_set(set.code())
            .unwrap_or_default(),
    };
    render(&state, "setDetail.html", &page)
}
