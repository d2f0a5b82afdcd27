use std::collections::VecDeque;

use thiserror::Error;

use crate::item::Item;

/// Failures surfaced by the queue engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `advance` was called with nothing queued. Callers must seed the queue first.
    #[error("cannot advance an empty queue")]
    EmptyQueue,

    /// The source failed while topping up the queue. `current` was already
    /// popped and `tail` is the queue without the replenishment.
    #[error("failed to replenish queue after popping {}: {cause:#}", .current.id)]
    Replenishment {
        current: Item,
        tail: VecDeque<Item>,
        cause: anyhow::Error,
    },

    /// The persistence collaborator failed.
    #[error("photo pool error: {0:#}")]
    Pool(anyhow::Error),
}
