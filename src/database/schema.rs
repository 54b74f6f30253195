use sqlx::SqlitePool;

// Booleans are stored as INTEGER 0/1 and timestamps as
// "%Y-%m-%d %H:%M:%S" TEXT throughout.
const SQL_CREATE_MEMBERS: &str = r#"
CREATE TABLE IF NOT EXISTS members (
  id         TEXT PRIMARY KEY,
  real_name  TEXT NOT NULL,
  email      TEXT NOT NULL,
  classof    TEXT NOT NULL,
  phone      TEXT,
  role       TEXT NOT NULL DEFAULT 'unconfirmed',
  status     TEXT NOT NULL DEFAULT 'active',
  penalty    INTEGER NOT NULL DEFAULT 0 CHECK (penalty >= 0)
)
"#;

const SQL_CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
  id                         TEXT PRIMARY KEY,
  title                      TEXT NOT NULL,
  date                       TEXT NOT NULL,
  address                    TEXT NOT NULL,
  description                TEXT NOT NULL,
  price                      INTEGER NOT NULL DEFAULT 0,
  duration                   INTEGER,
  public                     INTEGER NOT NULL DEFAULT 0,
  binding_registration       INTEGER NOT NULL DEFAULT 0,
  transportation             INTEGER NOT NULL DEFAULT 0,
  food                       INTEGER NOT NULL DEFAULT 0,
  extra_information          TEXT,
  max_participants           INTEGER,
  room_number                TEXT,
  building                   TEXT,
  registration_opening_date  TEXT,
  confirmed                  INTEGER NOT NULL DEFAULT 0,
  host                       TEXT NOT NULL
)
"#;

const SQL_CREATE_EVENT_PARTICIPANTS: &str = r#"
CREATE TABLE IF NOT EXISTS event_participants (
  event_id              TEXT NOT NULL,
  member_id             TEXT NOT NULL,
  position              INTEGER NOT NULL,
  real_name             TEXT NOT NULL,
  email                 TEXT NOT NULL,
  classof               TEXT NOT NULL,
  phone                 TEXT,
  role                  TEXT NOT NULL,
  food                  INTEGER NOT NULL DEFAULT 0,
  transportation        INTEGER NOT NULL DEFAULT 0,
  dietary_restrictions  TEXT NOT NULL DEFAULT '',
  penalty               INTEGER NOT NULL DEFAULT 0,
  confirmed             INTEGER,
  attended              INTEGER,
  submit_date           TEXT NOT NULL,
  PRIMARY KEY (event_id, member_id)
)
"#;

const SQL_CREATE_EVENT_PENALTY_REGISTRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS event_penalty_registrations (
  event_id   TEXT NOT NULL,
  member_id  TEXT NOT NULL,
  PRIMARY KEY (event_id, member_id)
)
"#;

/// Creates all tables if missing. Run once at startup; test pools run it
/// against `sqlite::memory:`.
pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(SQL_CREATE_MEMBERS).execute(pool).await?;
    sqlx::query(SQL_CREATE_EVENTS).execute(pool).await?;
    sqlx::query(SQL_CREATE_EVENT_PARTICIPANTS).execute(pool).await?;
    sqlx::query(SQL_CREATE_EVENT_PENALTY_REGISTRATIONS)
        .execute(pool)
        .await?;
    Ok(())
}
