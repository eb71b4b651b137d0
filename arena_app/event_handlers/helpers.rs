use tracing::debug;

use arena_types::errors::ApplicationError;

use crate::{
    cache::{cache_set, keys},
    events::{EventHandlerContext, LiveMatchSnapshot},
};

/// Writes the in-progress snapshot unless the match has already ended.
///
/// The fence is checked again after the write: if the `ended` event was
/// handled in between, the entry it deleted is deleted again.
pub async fn write_live_snapshot(
    ctx: &EventHandlerContext,
    snapshot: &LiveMatchSnapshot,
) -> Result<(), ApplicationError> {
    if ctx.fence.is_sealed(snapshot.match_id).await {
        debug!("Match already ended, skipping live snapshot");
        return Ok(());
    }

    let key = keys::live_match(snapshot.match_id);
    cache_set(
        ctx.cache.as_ref(),
        &key,
        snapshot,
        ctx.config.match_cache_ttl,
    )
    .await?;

    if ctx.fence.is_sealed(snapshot.match_id).await {
        debug!("Match ended while writing live snapshot, removing it");
        ctx.cache.delete(&key).await?;
    }
    Ok(())
}
