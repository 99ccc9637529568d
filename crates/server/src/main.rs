// crates/server/src/main.rs
//! Houseview server binary.
//!
//! Binds the HTTP server over a single upstream connection configured from
//! flags or environment, then serves the panel API until ctrl-c.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use houseview_core::ConnectionStore;
use houseview_server::{create_app, metrics::init_metrics, AppState};
use houseview_transport::HttpTransport;
use houseview_types::{ConnectionConfig, QuerySettings};

#[derive(Debug, Parser)]
#[command(name = "houseview", version, about = "Panel server for ClickHouse-compatible upstreams")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "HOUSEVIEW_PORT", default_value_t = 47830)]
    port: u16,

    /// Upstream HTTP URL.
    #[arg(long, env = "HOUSEVIEW_URL", default_value = "http://localhost:8123")]
    url: String,

    /// Upstream username.
    #[arg(long, env = "HOUSEVIEW_USER", default_value = "default")]
    user: String,

    /// Upstream password.
    #[arg(long, env = "HOUSEVIEW_PASSWORD")]
    password: Option<String>,

    /// IANA timezone used to format time-span boundaries.
    #[arg(long, env = "HOUSEVIEW_TIMEZONE", default_value = "UTC")]
    timezone: String,

    /// Directory with the frontend bundle. Omit for API-only mode.
    #[arg(long, env = "HOUSEVIEW_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    init_metrics();

    eprintln!("\nhouseview v{}\n", env!("CARGO_PKG_VERSION"));

    let connection = ConnectionConfig::new("default", args.url.clone())
        .with_credentials(args.user.clone(), args.password.clone())
        .with_default_settings(QuerySettings::new());
    let transport = Arc::new(HttpTransport::new(&connection)?);
    let connections = Arc::new(ConnectionStore::with_connection(connection));

    let state = AppState::new(connections, transport, args.timezone.clone());
    let app = create_app(state, args.static_dir.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, upstream = %args.url, "Listening");
    eprintln!("  Ready on http://{addr}  (upstream {})\n", args.url);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
