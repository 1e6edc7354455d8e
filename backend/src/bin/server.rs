//! Cellzone HTTP Server Binary
//!
//! Serves live cluster map views over a REST API. Each view subscribes to
//! the producer's SSE stream and renders the latest snapshot on request.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin cellzone-server
//!
//! CELLZONE_PRODUCER_URL=http://producer:8080/api/adb PORT=9000 \
//!   cargo run --bin cellzone-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8090)
//! - `CELLZONE_PRODUCER_URL`: Producer base URL
//! - `CELLZONE_KPI_URL`: KPI service base URL
//! - `CELLZONE_QUALITY_CONFIG`: Quality ladder/palette file
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cellzone::config::AppConfig;
use cellzone::http::{create_router, AppState};
use cellzone::kpi::HttpKpiSource;
use cellzone::stream::SseTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Cellzone HTTP Server");

    let config = AppConfig::load()?;
    let quality = config.quality()?;
    info!(
        "Quality config v{} with schemes: {}",
        quality.version,
        quality.scheme_names().collect::<Vec<_>>().join(", ")
    );

    let transport = SseTransport::new(&config.producer.base_url, config.connect_timeout())?;
    let kpi = HttpKpiSource::new(&config.producer.kpi_url, config.kpi_timeout())?;
    info!("Producer: {}", config.producer.base_url);

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::new(config, quality, Arc::new(transport)).with_kpi_source(Arc::new(kpi));
    let app = create_router(state);

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
