use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use humantime::format_duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use photo_rotator::companion::PlayerctlCompanion;
use photo_rotator::config::Configuration;
use photo_rotator::engine::advance::advance;
use photo_rotator::engine::library::load as load_library;
use photo_rotator::events::{CompanionCommand, SessionCommand};
use photo_rotator::manifest::ManifestLibrary;
use photo_rotator::slideshow::{SlideshowState, SlideshowStore};
use photo_rotator::status::StatusStore;
use photo_rotator::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "photo-rotator",
    version,
    about = "Rotates a photo library on a timer"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Deterministic RNG seed for shuffling (overrides shuffle-seed)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Print the next N slides without starting the session
    #[arg(long = "dry-run", value_name = "SLIDES")]
    dry_run: Option<usize>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(
        format!("photo_rotator={level}")
            .parse()
            .context("invalid log directive")?,
    );
    fmt().with_env_filter(filter).with_target(false).compact().init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        seed,
        dry_run,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let seed = seed.or(cfg.shuffle_seed);
    let library = Arc::new(ManifestLibrary::new(
        cfg.library_path.clone(),
        cfg.pool_capacity,
        cfg.prefetch_batch,
        seed,
    ));
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if let Some(slides) = dry_run {
        return run_dry_run(&library, &mut rng, slides).await;
    }

    // Seed the queue once before the driver starts.
    let initial = load_library(library.as_ref(), &mut rng)
        .await
        .context("failed to load photo library")?;
    library.note_queued(&initial);
    if initial.is_empty() {
        info!(
            library = %cfg.library_path.display(),
            "library is empty; waiting for the pool refresh to find photos"
        );
    }

    let slideshow = SlideshowStore::new(cfg.slide_ticks());
    slideshow.set_queue(VecDeque::from(initial));
    let status = StatusStore::new();

    // Presentation hooks.
    let _showing = slideshow.subscribe({
        let last = std::sync::Mutex::new(None::<String>);
        move |state: &SlideshowState| {
            let Some(item) = &state.current else { return };
            let mut last = last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if last.as_deref() != Some(item.id.as_str()) {
                info!(
                    id = %item.id,
                    url = %item.url(),
                    by = %item.attribution_name,
                    queued = state.queue.len(),
                    "now showing"
                );
                *last = Some(item.id.clone());
            }
        }
    });
    let _playing = status.subscribe(|state| match &state.status {
        Some(s) => info!(title = %s.title, artist = %s.subtitle, state = %s.state, "now playing"),
        None => tracing::debug!("nothing playing"),
    });

    let (session_tx, session_rx) = mpsc::channel::<SessionCommand>(16); // Signals -> Session
    let (companion_tx, companion_rx) = mpsc::channel::<CompanionCommand>(16); // Signals -> Poller
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    #[cfg(unix)]
    spawn_signal_controls(cancel.clone(), session_tx.clone());

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let source = Arc::clone(&library);
        let store = slideshow.clone();
        let cancel = cancel.clone();
        let tick = cfg.tick_interval;
        async move {
            tasks::session::run(source, store, session_rx, cancel, tick)
                .await
                .context("session task failed")
        }
    });

    tasks.spawn({
        let pool = Arc::clone(&library);
        let cancel = cancel.clone();
        let every = cfg.pool_refresh_interval;
        async move {
            tasks::refresh::run(pool, cancel, every)
                .await
                .context("pool refresh task failed")
        }
    });

    if cfg.companion.enabled {
        let companion = Arc::new(PlayerctlCompanion::new(cfg.companion.player.clone()));
        let store = status.clone();
        let cancel = cancel.clone();
        let poll = cfg.status_poll_interval;
        tasks.spawn(async move {
            tasks::poller::run(companion, store, companion_rx, cancel, poll)
                .await
                .context("status poller failed")
        });
    } else {
        drop(companion_rx);
    }
    drop(companion_tx);

    info!(
        slide = %format_duration(cfg.slide_duration),
        refresh = %format_duration(cfg.pool_refresh_interval),
        "slideshow running"
    );

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

/// SIGUSR1 toggles pause, SIGUSR2 skips to the next photo.
#[cfg(unix)]
fn spawn_signal_controls(cancel: CancellationToken, control: mpsc::Sender<SessionCommand>) {
    tokio::spawn(async move {
        let (mut usr1, mut usr2) = match (
            signal(SignalKind::user_defined1()),
            signal(SignalKind::user_defined2()),
        ) {
            (Ok(usr1), Ok(usr2)) => (usr1, usr2),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!("failed to register control signal handlers: {err}");
                return;
            }
        };
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => break,
                received = usr1.recv() => match received {
                    Some(()) => SessionCommand::TogglePause,
                    None => break,
                },
                received = usr2.recv() => match received {
                    Some(()) => SessionCommand::Skip,
                    None => break,
                },
            };
            info!(?command, "control signal received");
            if let Err(err) = control.send(command).await {
                tracing::warn!("failed to forward control signal: {err}");
                break;
            }
        }
    });
}

async fn run_dry_run(library: &ManifestLibrary, rng: &mut StdRng, slides: usize) -> Result<()> {
    let initial = load_library(library, rng)
        .await
        .context("failed to load photo library")?;
    library.note_queued(&initial);

    println!(
        "# slideshow dry run\n# library: {}\n# stored photos: {}\n# slides: {}\n",
        library.root().display(),
        initial.len(),
        slides
    );

    let mut queue = VecDeque::from(initial);
    for idx in 0..slides {
        if queue.is_empty() {
            println!("(queue empty)");
            break;
        }
        let next = advance(library, queue)
            .await
            .context("dry-run advance failed")?;
        println!(
            "  {:>4}: {} (queued {})",
            idx + 1,
            next.current.id,
            next.queue.len()
        );
        queue = next.queue;
    }
    Ok(())
}
