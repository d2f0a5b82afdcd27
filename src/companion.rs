//! Companion controller that shells out to `playerctl`.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::item::{PlaybackState, Status};
use crate::ports::Companion;

const STATUS_FORMAT: &str = "{{status}}\t{{title}}\t{{artist}}";

#[derive(Debug, Clone, Default)]
pub struct PlayerctlCompanion {
    player: Option<String>,
}

impl PlayerctlCompanion {
    pub fn new(player: Option<String>) -> Self {
        Self { player }
    }

    async fn playerctl(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("playerctl");
        if let Some(player) = &self.player {
            cmd.arg("--player").arg(player);
        }
        let output = cmd
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .context("failed to spawn playerctl")?;
        if !output.status.success() {
            bail!(
                "playerctl {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Companion for PlayerctlCompanion {
    async fn play_pause(&self) -> Result<()> {
        debug!("toggling play/pause");
        self.playerctl(&["play-pause"]).await.map(|_| ())
    }

    async fn skip_next(&self) -> Result<()> {
        debug!("skipping to next track");
        self.playerctl(&["next"]).await.map(|_| ())
    }

    async fn status(&self) -> Option<Status> {
        match self
            .playerctl(&["metadata", "--format", STATUS_FORMAT])
            .await
        {
            Ok(out) => parse_status(&out),
            Err(err) => {
                debug!("no companion status: {err:#}");
                None
            }
        }
    }
}

/// Parses one `status<TAB>title<TAB>artist` line.
pub fn parse_status(line: &str) -> Option<Status> {
    let mut parts = line.trim_end_matches(['\r', '\n']).splitn(3, '\t');
    let state = match parts.next()?.trim() {
        "Playing" => PlaybackState::Active,
        "Paused" => PlaybackState::Held,
        "Stopped" => PlaybackState::Idle,
        _ => return None,
    };
    let title = non_empty_or_unknown(parts.next());
    let subtitle = non_empty_or_unknown(parts.next());
    Some(Status {
        title,
        subtitle,
        state,
    })
}

fn non_empty_or_unknown(field: Option<&str>) -> String {
    match field.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "Unknown".to_string(),
    }
}
