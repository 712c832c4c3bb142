//! Daily draw trigger
//!
//! Draws today's album once at startup (catching up after downtime) and then
//! again right after every local midnight in the reference timezone.

use std::sync::Arc;
use std::time::Duration;

use aotd_core::boundary::until_next_boundary;
use aotd_core::{DailySelection, Error};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Fallback wait when the next boundary cannot be computed
const RETRY_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Small delay past midnight so "today" has rolled over when we wake
const BOUNDARY_SLACK: Duration = Duration::from_secs(1);

/// Run until a shutdown signal arrives
pub async fn run(state: Arc<AppState>, mut shutdown_rx: broadcast::Receiver<()>) {
    draw_today(state.clone()).await;

    loop {
        let wait = until_next_boundary(state.timezone(), state.now())
            .and_then(|d| d.to_std().ok())
            .map(|d| d + BOUNDARY_SLACK)
            .unwrap_or(RETRY_INTERVAL);
        debug!(wait_secs = wait.as_secs(), "Sleeping until next draw");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                draw_today(state.clone()).await;
            }
            _ = shutdown_rx.recv() => {
                info!("Daily trigger shutting down");
                break;
            }
        }
    }
}

/// Draw (or fetch) today's selection. Failures are logged, never retried
/// until the next tick.
pub async fn draw_today(state: Arc<AppState>) -> Option<DailySelection> {
    let today = state.today();
    let outcome =
        tokio::task::spawn_blocking(move || state.scheduler.get_or_create_selection(today)).await;

    match outcome {
        Ok(Ok(selection)) => {
            info!(
                date = %selection.date,
                album_id = %selection.submission_id,
                manually_selected = selection.manually_selected,
                "Album of the Day ready"
            );
            Some(selection)
        }
        Ok(Err(Error::NoEligibleSubmissions { date })) => {
            error!(%date, "Daily draw found no eligible submissions");
            None
        }
        Ok(Err(e)) => {
            error!(date = %today, error = %e, "Daily draw failed");
            None
        }
        Err(e) => {
            error!(date = %today, error = %e, "Daily draw task panicked");
            None
        }
    }
}
