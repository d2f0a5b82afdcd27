use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::error::EngineError;
use crate::item::Item;
use crate::ports::Pool;

/// Loads the whole stored pool in a uniformly random order.
///
/// An empty pool is not an error; the caller decides what "no items" looks like.
pub async fn load<P, R>(pool: &P, rng: &mut R) -> Result<Vec<Item>, EngineError>
where
    P: Pool + ?Sized,
    R: Rng + ?Sized,
{
    let mut items = pool.stored_items().await.map_err(EngineError::Pool)?;
    items.shuffle(rng);
    info!(count = items.len(), "library loaded (shuffled)");
    Ok(items)
}
