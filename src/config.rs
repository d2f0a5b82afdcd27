use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory holding the photos and their `manifest.json`.
    pub library_path: PathBuf,
    /// How long each photo stays on screen.
    #[serde(with = "humantime_serde")]
    pub slide_duration: Duration,
    /// One countdown step.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Items dealt per replenishment fetch.
    pub prefetch_batch: usize,
    /// Pool size at which background refresh stops adding photos.
    pub pool_capacity: usize,
    /// Cadence of the background pool refresh.
    #[serde(with = "humantime_serde")]
    pub pool_refresh_interval: Duration,
    /// Cadence of companion status polling.
    #[serde(with = "humantime_serde")]
    pub status_poll_interval: Duration,
    /// Optional deterministic seed for shuffling and dealing.
    pub shuffle_seed: Option<u64>,
    pub companion: CompanionOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompanionOptions {
    pub enabled: bool,
    /// Restrict control to one player name instead of whichever is active.
    pub player: Option<String>,
}

impl Configuration {
    const fn default_slide_duration() -> Duration {
        Duration::from_secs(5 * 60)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.library_path.as_os_str().is_empty(),
            "library-path must be set"
        );
        ensure!(
            self.slide_duration >= Duration::from_secs(1),
            "slide-duration must be at least one second"
        );
        ensure!(
            !self.tick_interval.is_zero(),
            "tick-interval must be greater than zero"
        );
        ensure!(
            self.slide_duration >= self.tick_interval,
            "slide-duration must span at least one tick-interval"
        );
        ensure!(
            self.prefetch_batch > 0,
            "prefetch-batch must be greater than zero"
        );
        ensure!(
            self.pool_capacity > 0,
            "pool-capacity must be greater than zero"
        );
        ensure!(
            !self.pool_refresh_interval.is_zero(),
            "pool-refresh-interval must be greater than zero"
        );
        ensure!(
            !self.status_poll_interval.is_zero(),
            "status-poll-interval must be greater than zero"
        );
        Ok(self)
    }

    /// Countdown start value: whole `tick-interval`s per slide.
    pub fn slide_ticks(&self) -> i64 {
        let tick = self.tick_interval.as_millis().max(1);
        i64::try_from(self.slide_duration.as_millis() / tick).unwrap_or(i64::MAX)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            library_path: PathBuf::new(),
            slide_duration: Self::default_slide_duration(),
            tick_interval: Duration::from_secs(1),
            prefetch_batch: 10,
            pool_capacity: 1000,
            pool_refresh_interval: Duration::from_secs(60 * 60),
            status_poll_interval: Duration::from_secs(2),
            shuffle_seed: None,
            companion: CompanionOptions::default(),
        }
    }
}

impl Default for CompanionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            player: None,
        }
    }
}
