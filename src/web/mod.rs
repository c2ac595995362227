//! Web front end for the miniature catalogue
//!
//! Server-rendered HTML pages. Every page request passes through two
//! middleware steps that attach the visitor's session and, if logged in,
//! their identity.

pub mod middleware;
mod pages;
pub mod templates;

pub use middleware::{CurrentUser, RequestSession};
pub use templates::Templates;

use crate::catalogue::Catalogue;
use crate::db::Database;
use crate::error::{CoreError, Result};
use crate::session::SessionManager;

use axum::{middleware as axum_middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// User lookup
    pub db: Arc<Database>,
    pub catalogue: Arc<Catalogue>,
    pub sessions: Arc<SessionManager>,
    pub templates: Arc<Templates>,
}

/// Start the web server and run until a shutdown signal arrives
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CoreError::Server(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Server(e.to_string()))?;

    Ok(())
}

/// Create the router with all pages
pub fn create_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/miniature/:id", get(pages::miniature_detail))
        .route("/set/:code", get(pages::set_detail))
        // Session first, then the user it names
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::resolve_session,
                ))
                .layer(axum_middleware::from_fn(middleware::resolve_user)),
        );

    Router::new()
        .route("/health", get(pages::health))
        .merge(page_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
