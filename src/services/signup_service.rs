//! Join/Leave manager: computes insertion positions on join, penalty
//! eligibility on leave, and the small per-registration mutations (options,
//! attendance, admin removal).
//!
//! Join and leave run without the roster guard; they are single appends and
//! removals, and a signup racing an admin reorder at worst lands on an
//! ordering the admin redoes. Leaving may trigger penalty propagation,
//! which takes the guard itself.

use sqlx::SqlitePool;
use tracing::info;

use crate::database::{event_repo, member_repo, penalty_registry_repo, roster_repo};
use crate::models::{EventRow, MemberRow};
use crate::services::dates;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::{penalty_service, roster_order};
use crate::state::RosterGuard;

/// Join-time choices, all optional on the wire.
#[derive(Debug, Default, Clone)]
pub struct JoinOptions {
    pub food: bool,
    pub transportation: bool,
    pub dietary_restrictions: String,
}

/// Partial update of the join-time choices.
#[derive(Debug, Default)]
pub struct OptionsPatch {
    pub food: Option<bool>,
    pub transportation: Option<bool>,
    pub dietary_restrictions: Option<String>,
}

/// `max` is true when the joiner/leaver saw a roster already at or over
/// capacity, i.e. the waitlist is in play.
#[derive(Debug)]
pub struct SignupOutcome {
    pub max: bool,
}

pub async fn join_event(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
    options: JoinOptions,
) -> ServiceResult<SignupOutcome> {
    let (event, member) = load_event_and_member(pool, event_id, member_id).await?;

    let now = dates::now();
    let start = dates::parse_db(&event.date)?;
    if dates::has_started(start, now) {
        return Err(ServiceError::EventStarted);
    }
    // admins may register anywhere, any time
    if !member.is_admin() {
        if !dates::registration_open(event.registration_opening_date.as_deref(), now) {
            return Err(ServiceError::RegistrationClosed);
        }
        if !event.is_public() {
            return Err(ServiceError::EventNotPublic);
        }
    }

    let roster = roster_repo::list_roster(pool, event_id).await?;
    if roster.iter().any(|p| p.member_id == member_id) {
        return Err(ServiceError::AlreadyJoined);
    }

    let position = roster_order::insertion_position(&roster, member.penalty);
    let submit_date = dates::format_db(now);
    let participant = roster_repo::NewParticipant {
        event_id,
        member_id,
        real_name: &member.real_name,
        email: &member.email,
        classof: &member.classof,
        phone: member.phone.as_deref(),
        role: &member.role,
        food: options.food,
        transportation: options.transportation,
        dietary_restrictions: &options.dietary_restrictions,
        penalty: member.penalty,
        submit_date: &submit_date,
    };
    roster_repo::insert_at_position(pool, participant, position).await?;
    info!(event_id, member_id, position, "member joined event");

    Ok(SignupOutcome {
        max: over_capacity(&event, roster.len()),
    })
}

pub async fn leave_event(
    pool: &SqlitePool,
    guard: &RosterGuard,
    event_id: &str,
    member_id: &str,
) -> ServiceResult<SignupOutcome> {
    let (event, _member) = load_event_and_member(pool, event_id, member_id).await?;

    let now = dates::now();
    let start = dates::parse_db(&event.date)?;
    if dates::has_started(start, now) {
        return Err(ServiceError::EventStarted);
    }

    let roster = roster_repo::list_roster(pool, event_id).await?;
    let participant = roster
        .iter()
        .find(|p| p.member_id == member_id)
        .ok_or(ServiceError::NotJoined)?;

    // eligibility is judged against the slot being vacated, so before removal
    let eligible = should_penalize(pool, &event, participant.position, member_id, now).await?;

    roster_repo::remove_participant(pool, event_id, member_id).await?;
    info!(event_id, member_id, penalized = eligible, "member left event");

    if eligible {
        // the registry is the at-most-once guard: only the call that
        // inserts the row hands out the penalty
        if penalty_registry_repo::register_penalty(pool, event_id, member_id).await? {
            penalty_service::penalize(pool, guard, member_id).await?;
        }
    }

    Ok(SignupOutcome {
        max: over_capacity(&event, roster.len()),
    })
}

/// Late cancellation of a reserved slot on a binding, capped event, at most
/// once per member per event. Waitlisted members are never penalized; an
/// uncapped event has no reserved slots, so nobody gets bumped and nobody
/// pays.
async fn should_penalize(
    pool: &SqlitePool,
    event: &EventRow,
    position: i64,
    member_id: &str,
    now: chrono::NaiveDateTime,
) -> ServiceResult<bool> {
    if !event.is_binding() {
        return Ok(false);
    }
    let start = dates::parse_db(&event.date)?;
    if !dates::is_late_cancellation(start, now) {
        return Ok(false);
    }
    let Some(max) = event.max_participants else {
        return Ok(false);
    };
    if position >= max {
        return Ok(false);
    }
    Ok(!penalty_registry_repo::is_registered(pool, &event.id, member_id).await?)
}

pub async fn update_own_options(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
    patch: OptionsPatch,
) -> ServiceResult<()> {
    require_event(pool, event_id).await?;
    let updated = roster_repo::set_options(
        pool,
        event_id,
        member_id,
        patch.food,
        patch.transportation,
        patch.dietary_restrictions.as_deref(),
    )
    .await?;
    if updated == 0 {
        return Err(ServiceError::NotJoined);
    }
    Ok(())
}

pub async fn set_attendance(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
    attended: bool,
) -> ServiceResult<()> {
    require_event(pool, event_id).await?;
    let updated = roster_repo::set_attended(pool, event_id, member_id, attended).await?;
    if updated == 0 {
        return Err(ServiceError::NotJoined);
    }
    Ok(())
}

/// Admin removal: no penalty path, no started-check.
pub async fn remove_participant(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> ServiceResult<()> {
    require_event(pool, event_id).await?;
    if !roster_repo::remove_participant(pool, event_id, member_id).await? {
        return Err(ServiceError::NotJoined);
    }
    info!(event_id, member_id, "participant removed by admin");
    Ok(())
}

pub async fn is_joined(pool: &SqlitePool, event_id: &str, member_id: &str) -> ServiceResult<bool> {
    require_event(pool, event_id).await?;
    Ok(roster_repo::find_participant(pool, event_id, member_id)
        .await?
        .is_some())
}

fn over_capacity(event: &EventRow, roster_len: usize) -> bool {
    event
        .max_participants
        .is_some_and(|max| roster_len as i64 >= max)
}

async fn require_event(pool: &SqlitePool, event_id: &str) -> ServiceResult<EventRow> {
    event_repo::load_event(pool, event_id)
        .await?
        .ok_or(ServiceError::EventNotFound)
}

async fn load_event_and_member(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> ServiceResult<(EventRow, MemberRow)> {
    let event = require_event(pool, event_id).await?;
    let member = member_repo::load_member(pool, member_id)
        .await?
        .ok_or(ServiceError::MemberNotFound)?;
    Ok((event, member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::member_repo;
    use crate::services::test_support::{
        assert_suffix_intact, join_all, member_ids, seed_event, seed_member, test_pool, EventSeed,
    };

    #[tokio::test]
    async fn first_joiner_keeps_position_zero() {
        // Scenario A: Y joining a capped event does not leapfrog X.
        let pool = test_pool().await;
        seed_member(&pool, "x", 0, "member").await;
        seed_member(&pool, "y", 0, "member").await;
        let mut seed = EventSeed::in_hours(48);
        seed.max_participants = Some(1);
        seed_event(&pool, "e1", seed).await;

        let first = join_event(&pool, "e1", "x", JoinOptions::default()).await.unwrap();
        assert!(!first.max);
        let second = join_event(&pool, "e1", "y", JoinOptions::default()).await.unwrap();
        assert!(second.max);

        let roster = roster_repo::list_roster(&pool, "e1").await.unwrap();
        assert_eq!(member_ids(&roster), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn clean_joiner_slots_before_deprioritized_suffix() {
        // Scenario B: [A(0), B(2)] + C(0) => [A, C, B].
        let pool = test_pool().await;
        seed_member(&pool, "a", 0, "member").await;
        seed_member(&pool, "b", 2, "member").await;
        seed_member(&pool, "c", 0, "member").await;
        seed_event(&pool, "e1", EventSeed::in_hours(48)).await;
        join_all(&pool, "e1", &["a", "b"]).await;

        join_event(&pool, "e1", "c", JoinOptions::default()).await.unwrap();

        let roster = roster_repo::list_roster(&pool, "e1").await.unwrap();
        assert_eq!(member_ids(&roster), vec!["a", "c", "b"]);
        assert_suffix_intact(&roster);
    }

    #[tokio::test]
    async fn join_is_rejected_twice() {
        let pool = test_pool().await;
        seed_member(&pool, "a", 0, "member").await;
        seed_event(&pool, "e1", EventSeed::in_hours(48)).await;
        join_event(&pool, "e1", "a", JoinOptions::default()).await.unwrap();
        let err = join_event(&pool, "e1", "a", JoinOptions::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyJoined));
    }

    #[tokio::test]
    async fn join_respects_window_publicity_and_start() {
        let pool = test_pool().await;
        seed_member(&pool, "a", 0, "member").await;
        seed_member(&pool, "admin", 0, "admin").await;

        let mut closed = EventSeed::in_hours(48);
        closed.registration_opens_in_hours = Some(24);
        seed_event(&pool, "closed", closed).await;
        let err = join_event(&pool, "closed", "a", JoinOptions::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::RegistrationClosed));
        // admins bypass the window
        join_event(&pool, "closed", "admin", JoinOptions::default()).await.unwrap();

        let mut private = EventSeed::in_hours(48);
        private.public = false;
        seed_event(&pool, "private", private).await;
        let err = join_event(&pool, "private", "a", JoinOptions::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::EventNotPublic));

        seed_event(&pool, "started", EventSeed::in_hours(-1)).await;
        let err = join_event(&pool, "started", "a", JoinOptions::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::EventStarted));
    }

    #[tokio::test]
    async fn late_reserved_slot_leave_is_penalized() {
        // Scenario D, reserved slot: binding event in 2h, cap 1, A at slot 0.
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        seed_member(&pool, "a", 0, "member").await;
        let mut seed = EventSeed::in_hours(2);
        seed.binding = true;
        seed.max_participants = Some(1);
        seed_event(&pool, "e1", seed).await;
        join_all(&pool, "e1", &["a"]).await;

        leave_event(&pool, &guard, "e1", "a").await.unwrap();

        let member = member_repo::load_member(&pool, "a").await.unwrap().unwrap();
        assert_eq!(member.penalty, 1);
        assert!(roster_repo::list_roster(&pool, "e1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn waitlist_leave_is_never_penalized() {
        // Scenario D, waitlist slot: same event, A on position 1.
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        seed_member(&pool, "x", 0, "member").await;
        seed_member(&pool, "a", 0, "member").await;
        let mut seed = EventSeed::in_hours(2);
        seed.binding = true;
        seed.max_participants = Some(1);
        seed_event(&pool, "e1", seed).await;
        join_all(&pool, "e1", &["x", "a"]).await;

        leave_event(&pool, &guard, "e1", "a").await.unwrap();

        let member = member_repo::load_member(&pool, "a").await.unwrap().unwrap();
        assert_eq!(member.penalty, 0);
    }

    #[tokio::test]
    async fn early_nonbinding_or_uncapped_leaves_are_free() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        seed_member(&pool, "a", 0, "member").await;

        // early cancellation on a binding capped event
        let mut early = EventSeed::in_hours(72);
        early.binding = true;
        early.max_participants = Some(5);
        seed_event(&pool, "early", early).await;
        // late but not binding
        let mut loose = EventSeed::in_hours(2);
        loose.max_participants = Some(5);
        seed_event(&pool, "loose", loose).await;
        // late and binding but uncapped
        let mut uncapped = EventSeed::in_hours(2);
        uncapped.binding = true;
        seed_event(&pool, "uncapped", uncapped).await;

        for event_id in ["early", "loose", "uncapped"] {
            join_all(&pool, event_id, &["a"]).await;
            leave_event(&pool, &guard, event_id, "a").await.unwrap();
        }

        let member = member_repo::load_member(&pool, "a").await.unwrap().unwrap();
        assert_eq!(member.penalty, 0);
    }

    #[tokio::test]
    async fn penalty_is_issued_at_most_once_per_event() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        seed_member(&pool, "a", 0, "member").await;
        let mut seed = EventSeed::in_hours(2);
        seed.binding = true;
        seed.max_participants = Some(2);
        seed_event(&pool, "e1", seed).await;

        // leave, rejoin, leave again: the registry caps it at one penalty
        join_all(&pool, "e1", &["a"]).await;
        leave_event(&pool, &guard, "e1", "a").await.unwrap();
        join_all(&pool, "e1", &["a"]).await;
        leave_event(&pool, &guard, "e1", "a").await.unwrap();

        let member = member_repo::load_member(&pool, "a").await.unwrap().unwrap();
        assert_eq!(member.penalty, 1);
    }

    #[tokio::test]
    async fn leave_requires_membership() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        seed_member(&pool, "a", 0, "member").await;
        seed_event(&pool, "e1", EventSeed::in_hours(48)).await;
        let err = leave_event(&pool, &guard, "e1", "a").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotJoined));
    }

    #[tokio::test]
    async fn options_and_attendance_touch_only_joined_members() {
        let pool = test_pool().await;
        seed_member(&pool, "a", 0, "member").await;
        seed_event(&pool, "e1", EventSeed::in_hours(48)).await;
        join_all(&pool, "e1", &["a"]).await;

        let patch = OptionsPatch {
            food: Some(true),
            dietary_restrictions: Some("vegan".into()),
            ..OptionsPatch::default()
        };
        update_own_options(&pool, "e1", "a", patch).await.unwrap();
        set_attendance(&pool, "e1", "a", true).await.unwrap();

        let row = roster_repo::find_participant(&pool, "e1", "a").await.unwrap().unwrap();
        assert_eq!(row.food, 1);
        assert_eq!(row.dietary_restrictions, "vegan");
        assert_eq!(row.attended, Some(1));

        let err = set_attendance(&pool, "e1", "ghost", true).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotJoined));
    }
}
