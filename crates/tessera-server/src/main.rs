mod config;
mod rotation;
mod sweep;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use tessera_api::auth::{AppState, AppStateInner, ServiceSettings};
use tessera_api::routes;
use tessera_core::assets::AssetCatalog;
use tessera_core::design_manager::Canvas;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init store
    let db = tessera_db::Database::open(&config.db_path)?;

    let catalog = match &config.asset_catalog {
        Some(path) => AssetCatalog::from_path(path)?,
        None => AssetCatalog::builtin(),
    };

    let app_state: AppState = Arc::new(AppStateInner::new(
        Arc::new(db),
        catalog,
        ServiceSettings {
            jwt_secret: config.jwt_secret.clone(),
            canvas: Canvas::new(config.canvas_width, config.canvas_height),
            autosave_debounce: config.autosave_debounce,
            theme_duration: chrono::Duration::days(config.theme_duration_days),
        },
    ));

    // First start installs the default theme
    if let Some(theme) = app_state.themes.initialize_default_theme()? {
        info!("Installed default theme \"{}\"", theme.name);
    }

    tokio::spawn(rotation::run_rotation_loop(
        app_state.themes.clone(),
        config.rotation_check,
    ));
    tokio::spawn(sweep::run_sweep_loop(app_state.clone(), config.idle_sweep));

    let app = routes::router(app_state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Tessera server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Don't lose edits still waiting on their debounce
    let flushed = app_state.workspace.flush_all();
    info!("Flushed {} pending designs on shutdown", flushed);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
