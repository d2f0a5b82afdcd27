use tracing::debug;

use crate::error::EngineError;
use crate::item::Item;
use crate::ports::Pool;

/// Asks the pool to acquire and persist a fresh batch.
///
/// Returns exactly what the pool added, which is empty once the pool is full.
pub async fn refresh_pool<P>(pool: &P) -> Result<Vec<Item>, EngineError>
where
    P: Pool + ?Sized,
{
    let added = pool.fetch_and_store().await.map_err(EngineError::Pool)?;
    debug!(added = added.len(), "pool refreshed");
    Ok(added)
}
