//! HTTP API.
//!
//! JSON over HTTP with bearer-token authentication. Uploads are raw request
//! bodies whose `Content-Type` header is the file's type; the file name and
//! an optional reason travel as query parameters.
//!
//! | Method | Path | Caller |
//! |---|---|---|
//! | `GET` | `/health` | anyone |
//! | `POST` | `/auth/login` | anyone |
//! | `POST` | `/auth/logout` | user |
//! | `GET` | `/auth/me` | user |
//! | `POST` | `/documents?name=&reason=` | user |
//! | `GET` | `/documents` | user |
//! | `GET` | `/documents/:id` | owner or admin |
//! | `GET` | `/documents/:id/content` | owner or admin |
//! | `DELETE` | `/documents/:id` | owner while pending, or admin |
//! | `GET` | `/admin/documents?status=` | admin |
//! | `GET` | `/admin/queue` | admin |
//! | `POST` | `/admin/documents/:id/decision` | admin |
//! | `GET` | `/admin/summary` | admin |

mod admin;
mod auth;
mod context;
mod documents;
mod error;
mod extractors;
mod health;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::Result;

pub use context::AppState;
pub use error::{ApiError, ErrorResponse};
pub use extractors::AuthUser;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/documents", post(documents::upload).get(documents::list))
        .route(
            "/documents/:id",
            get(documents::get).delete(documents::delete),
        )
        .route("/documents/:id/content", get(documents::content))
        .route("/admin/documents", get(admin::list))
        .route("/admin/queue", get(admin::queue))
        .route("/admin/documents/:id/decision", post(admin::decide))
        .route("/admin/summary", get(admin::summary))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
