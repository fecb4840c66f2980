use std::sync::Arc;

use maakhana_survey::config::{ServerConfig, SurveyConfig};
use maakhana_survey::store::LibSqlBackend;
use maakhana_survey::survey::registry::SWEEP_INTERVAL;
use maakhana_survey::survey::{SessionRegistry, SurveyRouteState, survey_routes};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server = ServerConfig::from_env()?;

    // Initialize tracing, mirrored to a daily log file when a log dir is set
    let (file_layer, _log_guard) = match &server.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "maakhana-survey.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    let survey = SurveyConfig::from_env()?;

    eprintln!("🍱 Maakhana survey v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   App version: {}", survey.app_version);
    eprintln!("   Database: {}", server.db_path.display());
    eprintln!("   API: http://0.0.0.0:{}/api/sessions\n", server.port);

    // ── Database ─────────────────────────────────────────────────────────
    let store = Arc::new(LibSqlBackend::new_local(&server.db_path).await?);

    // ── HTTP ─────────────────────────────────────────────────────────────
    let registry = SessionRegistry::new(survey, store);
    let _sweep_handle = SessionRegistry::spawn_sweeper(Arc::clone(&registry), SWEEP_INTERVAL);
    let app = survey_routes(SurveyRouteState { registry })
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server.port)).await?;
    tracing::info!(port = server.port, "Survey server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Survey server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
