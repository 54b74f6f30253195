//! Admin roster reordering. All validation happens eagerly against the
//! current roster, so a rejected reorder leaves no trace; the accepted one
//! is applied with position-swap semantics and persisted in one pass, under
//! the roster guard.

use sqlx::SqlitePool;
use tracing::info;

use crate::database::{event_repo, roster_repo};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::roster_order::{self, PositionUpdate};
use crate::state::RosterGuard;

pub async fn reorder_participants(
    pool: &SqlitePool,
    guard: &RosterGuard,
    event_id: &str,
    updates: Vec<PositionUpdate>,
) -> ServiceResult<()> {
    let _cs = guard.lock().await;

    let event = event_repo::load_event(pool, event_id)
        .await?
        .ok_or(ServiceError::EventNotFound)?;
    let roster = roster_repo::list_roster(pool, event_id).await?;

    roster_order::validate_reorder(&roster, &updates, event.max_participants)?;
    let order = roster_order::apply_swaps(&roster, &updates);
    roster_repo::store_positions(pool, event_id, &order).await?;
    info!(event_id, moves = updates.len(), "roster reordered");
    Ok(())
}
