use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::CompanionCommand;
use crate::ports::Companion;
use crate::status::StatusStore;

/// Polls the companion player into `store` and forwards transport commands.
///
/// Transport failures are logged and otherwise ignored; a missing player
/// simply shows up as no status.
pub async fn run<C>(
    companion: Arc<C>,
    store: StatusStore,
    mut commands: Receiver<CompanionCommand>,
    cancel: CancellationToken,
    poll: Duration,
) -> Result<()>
where
    C: Companion + ?Sized,
{
    let mut ticker = interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting status poller");
                break;
            }

            _ = ticker.tick() => {
                refresh(companion.as_ref(), &store).await;
            }

            maybe_cmd = commands.recv(), if commands_open => {
                match maybe_cmd {
                    Some(CompanionCommand::PlayPause) => {
                        if let Err(err) = companion.play_pause().await {
                            warn!("play/pause failed: {err:#}");
                        }
                        refresh(companion.as_ref(), &store).await;
                    }
                    Some(CompanionCommand::SkipNext) => {
                        if let Err(err) = companion.skip_next().await {
                            warn!("skip to next track failed: {err:#}");
                        }
                        refresh(companion.as_ref(), &store).await;
                    }
                    Some(CompanionCommand::ToggleOverlay) => store.toggle_overlay(),
                    None => commands_open = false,
                }
            }
        }
    }

    Ok(())
}

async fn refresh<C>(companion: &C, store: &StatusStore)
where
    C: Companion + ?Sized,
{
    let status = companion.status().await;
    if store.snapshot().status != status {
        debug!(?status, "companion status changed");
        store.set_status(status);
    }
}
