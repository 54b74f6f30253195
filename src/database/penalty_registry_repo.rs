use sqlx::SqlitePool;

// Per-event record of members already penalized for it. The primary key
// plus INSERT OR IGNORE gives the at-most-once guard: a 0-row insert means
// the penalty was already issued.

const SQL_REGISTER_PENALTY: &str = r#"
INSERT OR IGNORE INTO event_penalty_registrations (event_id, member_id)
VALUES (?, ?)
"#;

const SQL_IS_REGISTERED: &str = r#"
SELECT COUNT(*) FROM event_penalty_registrations
WHERE event_id = ? AND member_id = ?
"#;

/// Returns true iff this call registered a new penalty for the pair.
pub async fn register_penalty(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> sqlx::Result<bool> {
    let res = sqlx::query(SQL_REGISTER_PENALTY)
        .bind(event_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() != 0)
}

pub async fn is_registered(
    pool: &SqlitePool,
    event_id: &str,
    member_id: &str,
) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(SQL_IS_REGISTERED)
        .bind(event_id)
        .bind(member_id)
        .fetch_one(pool)
        .await?;
    Ok(count != 0)
}
