//! Roster ordering rules.
//!
//! A roster is a total order over participants; position 0 is the highest
//! priority. Participants whose member penalty has reached
//! [`DEPRIORITIZE_THRESHOLD`] must form a contiguous suffix, and when an
//! event has a participant cap, confirmed participants may never sit at or
//! past the cap. Everything here is pure; the services apply the results
//! through the roster repo.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::EventParticipantRow;

/// Member penalty count at which a participant is demoted to the roster tail.
pub const DEPRIORITIZE_THRESHOLD: i64 = 2;

pub fn is_deprioritized(penalty: i64) -> bool {
    penalty >= DEPRIORITIZE_THRESHOLD
}

pub fn deprioritized_count(roster: &[EventParticipantRow]) -> usize {
    roster.iter().filter(|p| p.is_deprioritized()).count()
}

/// Position for a new joiner: append at the end, except that a
/// non-deprioritized joiner slots in just ahead of the deprioritized
/// suffix. Join order is otherwise preserved.
pub fn insertion_position(roster: &[EventParticipantRow], joiner_penalty: i64) -> i64 {
    let mut pos = roster.len();
    if !is_deprioritized(joiner_penalty) {
        pos -= deprioritized_count(roster);
    }
    pos as i64
}

/// One requested move of an admin reorder.
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub member_id: String,
    pub position: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("update list must cover all {expected} participants, got {got} entries")]
    WrongLength { expected: usize, got: usize },
    #[error("participant {0} is not on the roster")]
    UnknownParticipant(String),
    #[error("participant {0} appears more than once")]
    DuplicateParticipant(String),
    #[error("position {0} is outside the roster")]
    PositionOutOfRange(i64),
    #[error("position {0} is assigned more than once")]
    DuplicatePosition(i64),
    #[error("participant {member_id} is deprioritized and cannot move to position {position}")]
    DeprioritizedAheadOfTail { member_id: String, position: i64 },
    #[error("participant {member_id} is confirmed and cannot be pushed to waitlist position {position}")]
    ConfirmedIntoWaitlist { member_id: String, position: i64 },
}

/// Checks an update list against the current roster: it must be a bijection
/// onto positions `0..len` over exactly the roster's members, keep every
/// deprioritized participant behind the deprioritization boundary, and (when
/// a cap is set) keep confirmed participants inside the reserved slots.
///
/// Runs before any write, so a rejected reorder has no side effects.
pub fn validate_reorder(
    roster: &[EventParticipantRow],
    updates: &[PositionUpdate],
    max_participants: Option<i64>,
) -> Result<(), ReorderError> {
    let len = roster.len();
    if updates.len() != len {
        return Err(ReorderError::WrongLength {
            expected: len,
            got: updates.len(),
        });
    }

    let by_id: HashMap<&str, &EventParticipantRow> =
        roster.iter().map(|p| (p.member_id.as_str(), p)).collect();

    let mut seen_ids: HashSet<&str> = HashSet::with_capacity(len);
    let mut seen_positions = vec![false; len];
    // last position a non-deprioritized participant may occupy
    let boundary = len as i64 - 1 - deprioritized_count(roster) as i64;

    for update in updates {
        let Some(participant) = by_id.get(update.member_id.as_str()) else {
            return Err(ReorderError::UnknownParticipant(update.member_id.clone()));
        };
        if !seen_ids.insert(update.member_id.as_str()) {
            return Err(ReorderError::DuplicateParticipant(update.member_id.clone()));
        }
        if update.position < 0 || update.position >= len as i64 {
            return Err(ReorderError::PositionOutOfRange(update.position));
        }
        if seen_positions[update.position as usize] {
            return Err(ReorderError::DuplicatePosition(update.position));
        }
        seen_positions[update.position as usize] = true;

        // A deprioritized participant may never move ahead of a
        // non-deprioritized one. Rosters that already violate the suffix
        // (legacy data) may keep the participant where it is.
        if participant.is_deprioritized()
            && update.position <= boundary
            && participant.position > boundary
        {
            return Err(ReorderError::DeprioritizedAheadOfTail {
                member_id: update.member_id.clone(),
                position: update.position,
            });
        }

        if let Some(max) = max_participants {
            if participant.is_confirmed() && update.position >= max {
                return Err(ReorderError::ConfirmedIntoWaitlist {
                    member_id: update.member_id.clone(),
                    position: update.position,
                });
            }
        }
    }

    Ok(())
}

/// Applies a validated update list with position-swap semantics: each
/// requested move swaps the moved participant with whoever currently holds
/// the target slot. Returns the resulting member-id order.
pub fn apply_swaps(roster: &[EventParticipantRow], updates: &[PositionUpdate]) -> Vec<String> {
    let mut order: Vec<String> = roster.iter().map(|p| p.member_id.clone()).collect();
    for update in updates {
        let from = order
            .iter()
            .position(|id| *id == update.member_id)
            .expect("validated update list covers the roster");
        order.swap(from, update.position as usize);
    }
    order
}
