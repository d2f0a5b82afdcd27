//! Collaborator boundaries consumed by the engine and its drivers.

use anyhow::Result;
use async_trait::async_trait;

use crate::item::{Item, Status};

/// Supplies fresh items for queue replenishment.
#[async_trait]
pub trait Source: Send + Sync {
    /// May return an empty batch. Deduplication against what is already
    /// queued is the implementor's job.
    async fn fetch_items(&self) -> Result<Vec<Item>>;
}

/// Persisted backing pool of items.
///
/// Implementations must tolerate `fetch_and_store` running concurrently with
/// reads and with `Source::fetch_items` on the same pool.
#[async_trait]
pub trait Pool: Send + Sync {
    async fn stored_items(&self) -> Result<Vec<Item>>;

    /// Acquires and persists a new batch, returning only what was added.
    /// Empty when the pool is already full.
    async fn fetch_and_store(&self) -> Result<Vec<Item>>;
}

/// Now-playing transport controller.
#[async_trait]
pub trait Companion: Send + Sync {
    async fn play_pause(&self) -> Result<()>;

    async fn skip_next(&self) -> Result<()>;

    /// `None` whenever the player cannot be reached, including when no
    /// player is running.
    async fn status(&self) -> Option<Status>;
}
