use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rosterd::{db, http};

/// Student roster daemon: CSV roster ingestion, module-marker tracking
/// and spreadsheet report export over HTTP.
#[derive(Parser, Debug)]
#[command(name = "rosterd", version)]
struct Args {
    /// Address to bind the HTTP server on.
    #[arg(long, env = "ROSTERD_BIND", default_value = "127.0.0.1:4310")]
    bind: SocketAddr,

    /// Directory holding the roster database.
    #[arg(long, env = "ROSTERD_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rosterd=info")),
        )
        .init();

    let conn = db::open_db(&args.data_dir)?;
    let state = Arc::new(http::AppState::new(conn));
    http::serve(args.bind, state).await
}
