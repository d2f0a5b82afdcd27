use std::collections::VecDeque;

use tracing::debug;

use crate::engine::prefetch::prefetch;
use crate::error::EngineError;
use crate::item::Item;
use crate::ports::Source;

/// Queue length below which `advance` replenishes before returning.
pub const LOW_WATER_MARK: usize = 3;

/// Result of one slide step.
#[derive(Debug, Clone, PartialEq)]
pub struct Advanced {
    pub current: Item,
    pub queue: VecDeque<Item>,
}

/// Pops the head of `queue` as the new current item.
///
/// When fewer than [`LOW_WATER_MARK`] items remain, the replenishing fetch is
/// awaited here so the returned pair is always complete. A failed fetch hands
/// back the popped item and the unreplenished tail inside
/// [`EngineError::Replenishment`].
pub async fn advance<S>(source: &S, mut queue: VecDeque<Item>) -> Result<Advanced, EngineError>
where
    S: Source + ?Sized,
{
    let current = queue.pop_front().ok_or(EngineError::EmptyQueue)?;

    if queue.len() >= LOW_WATER_MARK {
        return Ok(Advanced { current, queue });
    }

    debug!(
        current = %current.id,
        remaining = queue.len(),
        "queue below low-water mark; replenishing"
    );
    // Keep a copy so a failed fetch can return the tail it consumed.
    let tail = queue.clone();
    match prefetch(source, queue).await {
        Ok(queue) => Ok(Advanced { current, queue }),
        Err(cause) => Err(EngineError::Replenishment {
            current,
            tail,
            cause,
        }),
    }
}
