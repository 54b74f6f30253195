use sqlx::SqlitePool;

use crate::models::EventParticipantRow;

// The roster is the ordered participant sequence of one event, stored as
// rows with a dense 0-based `position`. Insert-at-index and
// remove-matching-id keep positions dense by shifting the tail.

const SQL_LIST_ROSTER: &str = r#"
SELECT event_id, member_id, position, real_name, email, classof, phone, role,
       food, transportation, dietary_restrictions, penalty, confirmed,
       attended, submit_date
FROM event_participants
WHERE event_id = ?
ORDER BY position
"#;

const SQL_FIND_PARTICIPANT: &str = r#"
SELECT event_id, member_id, position, real_name, email, classof, phone, role,
       food, transportation, dietary_restrictions, penalty, confirmed,
       attended, submit_date
FROM event_participants
WHERE event_id = ? AND member_id = ?
"#;

const SQL_SHIFT_UP_FROM: &str = r#"
UPDATE event_participants
SET position = position + 1
WHERE event_id = ? AND position >= ?
"#;

const SQL_SHIFT_DOWN_AFTER: &str = r#"
UPDATE event_participants
SET position = position - 1
WHERE event_id = ? AND position > ?
"#;

const SQL_INSERT_PARTICIPANT: &str = r#"
INSERT INTO event_participants (
  event_id, member_id, position, real_name, email, classof, phone, role,
  food, transportation, dietary_restrictions, penalty, confirmed, attended,
  submit_date
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SQL_DELETE_PARTICIPANT: &str = r#"
DELETE FROM event_participants
WHERE event_id = ? AND member_id = ?
"#;

const SQL_SET_POSITION: &str = r#"
UPDATE event_participants
SET position = ?
WHERE event_id = ? AND member_id = ?
"#;

const SQL_SET_CONFIRMED: &str = r#"
UPDATE event_participants
SET confirmed = ?
WHERE event_id = ? AND member_id = ?
"#;

const SQL_SET_ATTENDED: &str = r#"
UPDATE event_participants
SET attended = ?
WHERE event_id = ? AND member_id = ?
"#;

const SQL_SET_OPTIONS: &str = r#"
UPDATE event_participants
SET food = COALESCE(?, food),
    transportation = COALESCE(?, transportation),
    dietary_restrictions = COALESCE(?, dietary_restrictions)
WHERE event_id = ? AND member_id = ?
"#;

const SQL_BUMP_PENALTY_SNAPSHOT: &str = r#"
UPDATE event_participants
SET penalty = penalty + 1
WHERE event_id = ? AND member_id = ?
"#;

pub struct NewParticipant<'a> {
    pub event_id: &'a str,
    pub member_id: &'a str,
    pub real_name: &'a str,
    pub email: &'a str,
    pub classof: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub food: bool,
    pub transportation: bool,
    pub dietary_restrictions: &'a str,
    pub penalty: i64,
    pub submit_date: &'a str,
}

pub async fn list_roster(
    pool: &SqlitePool,
    event_id: &str,
) -> sqlx::Result<Vec<EventParticipantRow>> {
    sqlx::query_as::<_, EventParticipantRow>(SQL_LIST_ROSTER)
        .bind(event_id)
        .fetch_all(pool)
        .await
}

pub async fn find_participant(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> sqlx::Result<Option<EventParticipantRow>> {
    sqlx::query_as::<_, EventParticipantRow>(SQL_FIND_PARTICIPANT)
        .bind(event_id)
        .bind(member_id)
        .fetch_optional(pool)
        .await
}

/// Inserts a participant snapshot at `position`, shifting everything at or
/// past that position one slot down the roster first.
pub async fn insert_at_position(
    pool: &SqlitePool,
    participant: NewParticipant<'_>,
    position: i64,
) -> sqlx::Result<()> {
    sqlx::query(SQL_SHIFT_UP_FROM)
        .bind(participant.event_id)
        .bind(position)
        .execute(pool)
        .await?;
    sqlx::query(SQL_INSERT_PARTICIPANT)
        .bind(participant.event_id)
        .bind(participant.member_id)
        .bind(position)
        .bind(participant.real_name)
        .bind(participant.email)
        .bind(participant.classof)
        .bind(participant.phone)
        .bind(participant.role)
        .bind(participant.food)
        .bind(participant.transportation)
        .bind(participant.dietary_restrictions)
        .bind(participant.penalty)
        .bind(Option::<i64>::None)
        .bind(Option::<i64>::None)
        .bind(participant.submit_date)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes the matching participant and closes the position gap. Returns
/// false when the member was not on the roster.
pub async fn remove_participant(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> sqlx::Result<bool> {
    let Some(row) = find_participant(pool, event_id, member_id).await? else {
        return Ok(false);
    };
    sqlx::query(SQL_DELETE_PARTICIPANT)
        .bind(event_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    sqlx::query(SQL_SHIFT_DOWN_AFTER)
        .bind(event_id)
        .bind(row.position)
        .execute(pool)
        .await?;
    Ok(true)
}

/// Persists a full ordering in one pass: `ordered[i]` gets position `i`.
pub async fn store_positions(
    pool: &SqlitePool,
    event_id: &str,
    ordered_member_ids: &[String],
) -> sqlx::Result<()> {
    for (pos, member_id) in ordered_member_ids.iter().enumerate() {
        sqlx::query(SQL_SET_POSITION)
            .bind(pos as i64)
            .bind(event_id)
            .bind(member_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn set_confirmed(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
    confirmed: bool,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_CONFIRMED)
        .bind(confirmed)
        .bind(event_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_attended(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
    attended: bool,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_ATTENDED)
        .bind(attended)
        .bind(event_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Partial update of the join-time choices; NULL binds keep stored values.
pub async fn set_options(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
    food: Option<bool>,
    transportation: Option<bool>,
    dietary_restrictions: Option<&str>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_OPTIONS)
        .bind(food)
        .bind(transportation)
        .bind(dietary_restrictions)
        .bind(event_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn bump_penalty_snapshot(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_BUMP_PENALTY_SNAPSHOT)
        .bind(event_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
