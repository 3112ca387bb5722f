use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tessera_core::themes::ThemeManager;
use tracing::{info, warn};

/// Background task that replaces the active theme once it ends.
///
/// Runs on an interval; each tick activates the next preset if the current
/// theme is over. Errors are logged and retried on the next tick.
pub async fn run_rotation_loop(themes: Arc<ThemeManager>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        match themes.rotate_if_expired(Utc::now()) {
            Ok(Some(theme)) => {
                info!("Rotation: \"{}\" is the new theme", theme.name);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Rotation error: {}", e);
            }
        }
    }
}
