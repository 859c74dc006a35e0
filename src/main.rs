//! Interval Timer - a lap-based work/rest timer daemon
//!
//! This is the main entry point for the interval-timer application.

use std::sync::Arc;
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

use interval_timer::{
    api::create_router,
    config::Config,
    services::{build_sink, NotificationCoordinator},
    state::{AppState, StatePublisher, TimerState},
    tasks::TimerService,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("interval_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting interval-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, session={}, mode={}, notify={:?}",
        config.host,
        config.port,
        config.configuration(),
        config.mode,
        config.notify
    );

    // Continuation mode setting, changeable at runtime through PUT /mode
    let (mode_tx, mode_rx) = watch::channel(config.mode);

    let sink = build_sink(config.notify, &config.feedback_commands());
    let coordinator = NotificationCoordinator::new(sink, mode_rx, config.feedback_delay());
    let configuration = config.configuration();
    let publisher = Arc::new(StatePublisher::new(TimerState::stopped(configuration)));
    let timer = TimerService::new(configuration, coordinator, publisher, config.settings())?;

    let state = Arc::new(AppState::new(timer.clone(), mode_tx, config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start         - Start a session (optional configuration body)");
    info!("  POST /pause         - Pause the running interval");
    info!("  POST /resume        - Resume a paused interval");
    info!("  POST /stop          - Stop the session");
    info!("  POST /dismiss       - Dismiss an active alarm");
    info!("  PUT  /configuration - Change laps and durations");
    info!("  GET  /mode          - Read the continuation mode");
    info!("  PUT  /mode          - Switch between auto and manual");
    info!("  GET  /status        - Current timer state");
    info!("  GET  /events        - Stream timer state as Server-Sent Events");
    info!("  GET  /health        - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    timer.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
