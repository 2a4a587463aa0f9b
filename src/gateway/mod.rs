//! Axum-based HTTP gateway.
//!
//! One task per request, body limits, and a request timeout; the only
//! shared state is the corpus directory, the credentials file, and the
//! in-process session map. Handlers live in [`handlers`], the HTML
//! renderers in [`pages`].

pub mod handlers;
pub mod pages;

use crate::auth::CredentialStore;
use crate::config::Config;
use crate::corpus::DocumentStore;
use crate::session::SessionStore;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (8 MiB) — bounds image uploads.
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Request timeout (30s) — file I/O is the only slow path here.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<DocumentStore>,
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            corpus: Arc::new(DocumentStore::new(&config.data_dir)),
            credentials: Arc::new(CredentialStore::new(&config.credentials_path)),
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
        }
    }
}

/// Build the full route table. Static segments win over the `{filename}`
/// captures, so the auth and form routes stay reachable.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/users/signin",
            get(handlers::signin_form).post(handlers::signin_submit),
        )
        .route("/users/signout", post(handlers::signout))
        .route(
            "/users/signup",
            get(handlers::signup_form).post(handlers::signup_submit),
        )
        .route("/new", get(handlers::new_document_form))
        .route("/create", post(handlers::create_document))
        .route(
            "/upload/image",
            get(handlers::upload_form).post(handlers::upload_image),
        )
        .route(
            "/{filename}",
            get(handlers::show_document).post(handlers::update_document),
        )
        .route("/{filename}/edit", get(handlers::edit_form))
        .route("/{filename}/delete", post(handlers::delete_document))
        .route(
            "/{filename}/duplicate",
            get(handlers::duplicate_form).post(handlers::duplicate_submit),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Bind and serve until the process is stopped.
pub async fn run(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let display_addr = listener.local_addr()?;

    let state = AppState::new(&config);
    let app = router(state);

    tracing::info!(
        corpus = %config.data_dir.display(),
        credentials = %config.credentials_path.display(),
        "quillpad starting"
    );
    println!("📚 Quillpad listening on http://{display_addr}");
    println!("  GET  /                 — document index");
    println!("  GET  /users/signin     — sign in");
    println!("  GET  /users/signup     — sign up");
    println!("  GET  /new              — new document form");
    println!("  GET  /upload/image     — image upload form");
    println!("  GET  /health           — health check");
    println!("  Press Ctrl+C to stop.\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
