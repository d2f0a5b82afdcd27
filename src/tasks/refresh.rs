use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::engine::cache::refresh_pool;
use crate::ports::Pool;

/// Periodically grows the backing pool, independent of queue replenishment.
///
/// The first refresh runs immediately. Failures are logged and retried on the
/// next period so a flaky pool only means fewer new photos.
#[instrument(skip_all, fields(every = %humantime::format_duration(every)))]
pub async fn run<P>(pool: Arc<P>, cancel: CancellationToken, every: Duration) -> Result<()>
where
    P: Pool + ?Sized,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting pool refresh task");
                break;
            }

            _ = ticker.tick() => {
                match refresh_pool(pool.as_ref()).await {
                    Ok(added) if added.is_empty() => info!("pool refresh added nothing"),
                    Ok(added) => info!(added = added.len(), "pool refresh stored new photos"),
                    Err(err) => warn!("pool refresh failed: {err}"),
                }
            }
        }
    }

    Ok(())
}
