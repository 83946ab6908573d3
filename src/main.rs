use std::net::SocketAddr;

use support_agent::api::{create_router, AppState};
use support_agent::infrastructure::{build_stack, AppConfig};
use support_agent::telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("api=info,support_agent=info,tower_http=info");

    let config = AppConfig::load()?;
    let stack = build_stack(&config).await?;
    info!(
        categories = ?stack.categories.names(),
        "support pipeline initialized"
    );

    let addr = SocketAddr::new(
        config.config.server.host.parse()?,
        config.config.server.port,
    );
    let app = create_router(AppState::new(stack, config));

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
