use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::advance::advance;
use crate::engine::prefetch::prefetch;
use crate::error::EngineError;
use crate::events::SessionCommand;
use crate::ports::Source;
use crate::slideshow::SlideshowStore;

/// Drives the slideshow: one countdown step per `tick`, an advance when the
/// countdown reaches zero.
///
/// Rules:
/// - This loop is the only writer of current/queue, and each advance is
///   awaited before the next event is looked at, so advances never overlap.
/// - While a replenishing fetch is pending the store keeps its old snapshot.
/// - Pause only stops ticking; a cycle already running still commits.
/// - An empty queue is never handed to `advance`; one prefetch is attempted
///   and the countdown restarts when that yields nothing.
/// - A failed replenishment still shows the popped item with the old tail.
pub async fn run<S>(
    source: Arc<S>,
    store: SlideshowStore,
    mut commands: Receiver<SessionCommand>,
    cancel: CancellationToken,
    tick: Duration,
) -> Result<()>
where
    S: Source + ?Sized,
{
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately; consume it so the countdown starts full.
    ticker.tick().await;

    if store.snapshot().current.is_none() {
        cycle(source.as_ref(), &store).await;
    }

    let mut commands_open = true;
    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting session task");
                break;
            }

            _ = ticker.tick() => {
                if store.snapshot().paused {
                    continue;
                }
                store.tick_countdown();
                if store.snapshot().countdown <= 0 {
                    cycle(source.as_ref(), &store).await;
                }
            }

            maybe_cmd = commands.recv(), if commands_open => {
                match maybe_cmd {
                    Some(SessionCommand::TogglePause) => {
                        store.toggle_paused();
                        info!(paused = store.snapshot().paused, "pause toggled");
                    }
                    Some(SessionCommand::Skip) => {
                        debug!("skip requested");
                        cycle(source.as_ref(), &store).await;
                    }
                    None => {
                        // Control side went away; keep the show running on the timer.
                        commands_open = false;
                    }
                }
            }
        }
    }

    Ok(())
}

/// One advance step, committed to `store` as a single snapshot.
async fn cycle<S>(source: &S, store: &SlideshowStore)
where
    S: Source + ?Sized,
{
    let mut queue = store.snapshot().queue.clone();

    if queue.is_empty() {
        queue = match prefetch(source, queue).await {
            Ok(queue) => queue,
            Err(err) => {
                warn!("replenishing an empty queue failed: {err:#}");
                store.reset_countdown();
                return;
            }
        };
        if queue.is_empty() {
            info!("no photos available; waiting for the next cycle");
            store.reset_countdown();
            return;
        }
    }

    match advance(source, queue).await {
        Ok(next) => {
            debug!(
                current = %next.current.id,
                queued = next.queue.len(),
                "advanced"
            );
            store.commit(next.current, next.queue);
        }
        Err(EngineError::Replenishment {
            current,
            tail,
            cause,
        }) => {
            warn!(
                current = %current.id,
                queued = tail.len(),
                "replenishment failed; retrying next cycle: {cause:#}"
            );
            store.commit(current, tail);
        }
        Err(err) => {
            warn!("advance failed: {err}");
            store.reset_countdown();
        }
    }
}
