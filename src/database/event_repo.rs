use sqlx::SqlitePool;

use crate::models::EventRow;

const SQL_LOAD_EVENT: &str = r#"
SELECT id, title, date, address, description, price, duration, public,
       binding_registration, transportation, food, extra_information,
       max_participants, room_number, building, registration_opening_date,
       confirmed, host
FROM events
WHERE id = ?
"#;

const SQL_INSERT_EVENT: &str = r#"
INSERT INTO events (
  id, title, date, address, description, price, duration, public,
  binding_registration, transportation, food, extra_information,
  max_participants, room_number, building, registration_opening_date,
  confirmed, host
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
"#;

// COALESCE merge: NULL bind keeps the stored value, so callers only ever
// write the fields they set. Clearing an optional column goes through the
// dedicated unset statements instead.
const SQL_PATCH_EVENT: &str = r#"
UPDATE events SET
  title                     = COALESCE(?, title),
  date                      = COALESCE(?, date),
  address                   = COALESCE(?, address),
  description               = COALESCE(?, description),
  price                     = COALESCE(?, price),
  public                    = COALESCE(?, public),
  transportation            = COALESCE(?, transportation),
  food                      = COALESCE(?, food),
  max_participants          = COALESCE(?, max_participants),
  registration_opening_date = COALESCE(?, registration_opening_date),
  confirmed                 = COALESCE(?, confirmed)
WHERE id = ?
"#;

const SQL_UNSET_MAX_PARTICIPANTS: &str = r#"
UPDATE events SET max_participants = NULL WHERE id = ?
"#;

const SQL_UNSET_REGISTRATION_OPENING_DATE: &str = r#"
UPDATE events SET registration_opening_date = NULL WHERE id = ?
"#;

const SQL_SET_CONFIRMED: &str = r#"
UPDATE events SET confirmed = ? WHERE id = ?
"#;

// Events this member is registered for that start after `now`, regardless
// of confirmation state; the penalty propagator filters confirmed events
// itself.
const SQL_FUTURE_EVENTS_FOR_MEMBER: &str = r#"
SELECT e.id, e.title, e.date, e.address, e.description, e.price, e.duration,
       e.public, e.binding_registration, e.transportation, e.food,
       e.extra_information, e.max_participants, e.room_number, e.building,
       e.registration_opening_date, e.confirmed, e.host
FROM events e
JOIN event_participants p ON p.event_id = e.id
WHERE p.member_id = ? AND e.date > ?
ORDER BY e.date
"#;

pub struct NewEvent<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    pub address: &'a str,
    pub description: &'a str,
    pub price: i64,
    pub duration: Option<i64>,
    pub public: bool,
    pub binding_registration: bool,
    pub transportation: bool,
    pub food: bool,
    pub extra_information: Option<&'a str>,
    pub max_participants: Option<i64>,
    pub room_number: Option<&'a str>,
    pub building: Option<&'a str>,
    pub registration_opening_date: Option<&'a str>,
    pub host: &'a str,
}

#[derive(Debug, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub public: Option<bool>,
    pub transportation: Option<bool>,
    pub food: Option<bool>,
    pub max_participants: Option<i64>,
    pub registration_opening_date: Option<String>,
    pub confirmed: Option<bool>,
    // explicit unsets, the patch equivalent of writing a JSON null
    pub unset_max_participants: bool,
    pub unset_registration_opening_date: bool,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.address.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.public.is_none()
            && self.transportation.is_none()
            && self.food.is_none()
            && self.max_participants.is_none()
            && self.registration_opening_date.is_none()
            && self.confirmed.is_none()
            && !self.unset_max_participants
            && !self.unset_registration_opening_date
    }
}

pub async fn load_event(pool: &SqlitePool, event_id: &str) -> sqlx::Result<Option<EventRow>> {
    sqlx::query_as::<_, EventRow>(SQL_LOAD_EVENT)
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_event(pool: &SqlitePool, event: NewEvent<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_EVENT)
        .bind(event.id)
        .bind(event.title)
        .bind(event.date)
        .bind(event.address)
        .bind(event.description)
        .bind(event.price)
        .bind(event.duration)
        .bind(event.public)
        .bind(event.binding_registration)
        .bind(event.transportation)
        .bind(event.food)
        .bind(event.extra_information)
        .bind(event.max_participants)
        .bind(event.room_number)
        .bind(event.building)
        .bind(event.registration_opening_date)
        .bind(event.host)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn patch_event(
    pool: &SqlitePool,
    event_id: &str,
    patch: &EventPatch,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_PATCH_EVENT)
        .bind(patch.title.as_deref())
        .bind(patch.date.as_deref())
        .bind(patch.address.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.public)
        .bind(patch.transportation)
        .bind(patch.food)
        .bind(patch.max_participants)
        .bind(patch.registration_opening_date.as_deref())
        .bind(patch.confirmed)
        .bind(event_id)
        .execute(pool)
        .await?;
    if patch.unset_max_participants {
        sqlx::query(SQL_UNSET_MAX_PARTICIPANTS)
            .bind(event_id)
            .execute(pool)
            .await?;
    }
    if patch.unset_registration_opening_date {
        sqlx::query(SQL_UNSET_REGISTRATION_OPENING_DATE)
            .bind(event_id)
            .execute(pool)
            .await?;
    }
    Ok(res.rows_affected())
}

pub async fn set_confirmed(pool: &SqlitePool, event_id: &str, confirmed: bool) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_CONFIRMED)
        .bind(confirmed)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn future_events_for_member(
    pool: &SqlitePool,
    member_id: &str,
    now: &str,
) -> sqlx::Result<Vec<EventRow>> {
    sqlx::query_as::<_, EventRow>(SQL_FUTURE_EVENTS_FOR_MEMBER)
        .bind(member_id)
        .bind(now)
        .fetch_all(pool)
        .await
}
