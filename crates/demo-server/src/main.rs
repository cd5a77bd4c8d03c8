//! Small demo server showing the session middleware end to end.
//!
//! Run it with `cargo run -p seabag-demo`, then poke it with curl
//! (`-b`/`-c` to carry the cookie):
//!
//! ```text
//! curl -c jar -b jar http://127.0.0.1:8080/
//! curl -c jar -b jar http://127.0.0.1:8080/set/theme/dark
//! curl -c jar -b jar http://127.0.0.1:8080/flash/info/saved
//! curl -c jar -b jar http://127.0.0.1:8080/notices
//! curl -c jar -b jar http://127.0.0.1:8080/reset
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::Path as UrlPath;
use axum::response::Redirect;
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use seabag_axum::{session_lifecycle, Session, SessionFailure, SessionManager};
use seabag_domain::SessionOptions;
use seabag_sessions::MemoryStore;

#[derive(Parser)]
#[command(name = "seabag-demo", about = "Cookie session demo server")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Optional TOML file with session options.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let options = load_options(cli.config.as_deref())?;

    let store = Arc::new(MemoryStore::new(Duration::from_secs(
        options.cache.expires_in_secs,
    )));
    let manager = SessionManager::new(options, store);

    let app = Router::new()
        .route("/", get(index))
        .route("/set/:key/:value", get(set_entry))
        .route("/take/:key", get(take_entry))
        .route("/flash/:kind/:message", get(push_notice))
        .route("/notices", get(drain_notices))
        .route("/reset", get(reset))
        .route_layer(middleware::from_fn_with_state(manager, session_lifecycle))
        // Health checks carry no session.
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "demo server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,seabag_axum=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn load_options(path: Option<&Path>) -> anyhow::Result<SessionOptions> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
        }
        None => {
            // The demo serves plain HTTP.
            let mut options = SessionOptions::default();
            options.cookie_options.secure = false;
            Ok(options)
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received SIGINT, shutting down");
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn index(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({
        "id": session.id(),
        "entries": session.entries(),
    }))
}

async fn set_entry(
    Extension(session): Extension<Session>,
    UrlPath((key, value)): UrlPath<(String, String)>,
) -> Result<Redirect, SessionFailure> {
    session.set(key, json!(value))?;
    Ok(Redirect::to("/"))
}

async fn take_entry(
    Extension(session): Extension<Session>,
    UrlPath(key): UrlPath<String>,
) -> Json<Value> {
    Json(json!({ "taken": session.take(&key) }))
}

async fn push_notice(
    Extension(session): Extension<Session>,
    UrlPath((kind, message)): UrlPath<(String, String)>,
) -> Json<Value> {
    Json(json!({ "pending": session.flash(&kind, json!(message)) }))
}

async fn drain_notices(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({ "notices": session.flash_drain() }))
}

async fn reset(Extension(session): Extension<Session>) -> Redirect {
    session.reset().await;
    Redirect::to("/")
}

async fn healthz() -> &'static str {
    "ok"
}
