//! Penalty propagation. A penalty is a member-level counter; every roster
//! the member sits on carries a snapshot of it. Incrementing the ledger
//! therefore walks all of the member's future registrations to keep the
//! snapshots and the roster order consistent with the new tier.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::{event_repo, member_repo, roster_repo};
use crate::services::dates;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::roster_order;
use crate::state::RosterGuard;

/// Increments the member's penalty and propagates it across every future
/// event they are registered for. Held under the roster guard for the whole
/// walk so it cannot interleave with a concurrent confirm or reorder.
///
/// Not atomic: if an event update fails mid-walk the error is surfaced and
/// the ledger increment stays committed. "Penalized with lagging rosters"
/// beats silently losing the penalty.
pub async fn penalize(pool: &SqlitePool, guard: &RosterGuard, member_id: &str) -> ServiceResult<()> {
    let _cs = guard.lock().await;

    let member = member_repo::load_member(pool, member_id)
        .await?
        .ok_or(ServiceError::MemberNotFound)?;
    // second infraction onward pushes the member into the deprioritized tier
    let should_deprioritize = member.penalty >= 1;

    member_repo::increment_penalty(pool, member_id).await?;
    info!(member_id, new_penalty = member.penalty + 1, "penalty registered");

    let now = dates::format_db(dates::now());
    let events = event_repo::future_events_for_member(pool, member_id, &now).await?;
    for event in &events {
        roster_repo::bump_penalty_snapshot(pool, &event.id, member_id).await?;
        // Confirmed events keep their roster: demotion must never evict a
        // secured spot.
        if should_deprioritize && !event.is_confirmed() {
            demote_to_tail(pool, &event.id, member_id).await?;
            warn!(member_id, event_id = %event.id, "participant demoted to roster tail");
        }
    }
    Ok(())
}

/// Re-seats the member by the join insertion rule: pulled out of the order
/// and re-inserted as if joining now, which appends a freshly deprioritized
/// member at the very end of the roster.
async fn demote_to_tail(pool: &SqlitePool, event_id: &str, member_id: &str) -> ServiceResult<()> {
    let mut roster = roster_repo::list_roster(pool, event_id).await?;
    let Some(idx) = roster.iter().position(|p| p.member_id == member_id) else {
        return Ok(());
    };
    let moved = roster.remove(idx);
    let pos = roster_order::insertion_position(&roster, moved.penalty) as usize;

    let mut order: Vec<String> = roster.into_iter().map(|p| p.member_id).collect();
    order.insert(pos, moved.member_id);
    roster_repo::store_positions(pool, event_id, &order).await?;
    Ok(())
}
