use clap::Parser;

use village_registry_api::{app, config, store, AppState};

#[derive(Debug, Parser)]
#[command(name = "village-registry-api", about = "Village records management API server")]
struct Args {
    /// Bind address (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = config::config();
    tracing::info!("starting village registry API in {:?} mode", config.environment);

    let store = store::connect_from_env().await?;
    let state = AppState::new(store);

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
