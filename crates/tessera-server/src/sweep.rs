use std::time::Duration;

use tessera_api::auth::AppState;
use tracing::debug;

/// Background task that drops settled working copies so the shared working
/// set only holds designs with edits in flight.
pub async fn run_sweep_loop(state: AppState, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        interval.tick().await;

        let evicted = state.workspace.evict_idle();
        if evicted > 0 {
            debug!("Sweep: dropped {} idle designs, {} still open", evicted, state.workspace.open_count());
        }
    }
}
