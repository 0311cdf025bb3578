use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{Level, info};

use common::pinning::pinata::PinataClient;
use server::config::AppConfig;
use server::pdf::DocumentRenderer;
use server::state::AppState;
use server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = Arc::new(AppConfig::load()?);

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_counters(&db).await?;

    let state = AppState {
        db,
        config: config.clone(),
        content_store: Arc::new(PinataClient::new(&config.pinning)),
        renderer: Arc::new(DocumentRenderer::new()),
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
