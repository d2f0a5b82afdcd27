use std::fmt;

use anyhow::{Result, ensure};

/// A displayable photo with its attribution. Built only through [`Item::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    /// Unique within any single queue snapshot.
    pub id: String,
    url: String,
    pub attribution_name: String,
    pub attribution_link: String,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        attribution_name: impl Into<String>,
        attribution_link: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let url = url.into();
        ensure!(!url.is_empty(), "item {id} has an empty url");
        Ok(Self {
            id,
            url,
            attribution_name: attribution_name.into(),
            attribution_link: attribution_link.into(),
        })
    }

    /// Resolved locator the presentation layer can open. Never empty.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Active,
    Held,
    Idle,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Held => "held",
            Self::Idle => "idle",
        })
    }
}

/// Now-playing snapshot reported by the companion player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub title: String,
    pub subtitle: String,
    pub state: PlaybackState,
}
