//! Fatigue Monitor - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging);

    info!("=== Fatigue Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        grace_ms = settings.dms.face_lost_grace_ms,
        window_ms = settings.dms.statistics.window_ms,
        "Starting fatigue analysis service..."
    );

    run_server(settings).await
}
