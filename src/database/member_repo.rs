use sqlx::SqlitePool;

use crate::models::MemberRow;

const SQL_LOAD_MEMBER: &str = r#"
SELECT id, real_name, email, classof, phone, role, status, penalty
FROM members
WHERE id = ?
"#;

const SQL_INCREMENT_PENALTY: &str = r#"
UPDATE members
SET penalty = penalty + 1
WHERE id = ?
"#;

pub async fn load_member(pool: &SqlitePool, member_id: &str) -> sqlx::Result<Option<MemberRow>> {
    sqlx::query_as::<_, MemberRow>(SQL_LOAD_MEMBER)
        .bind(member_id)
        .fetch_optional(pool)
        .await
}

/// The penalty ledger only ever counts up; decrements are an admin concern
/// handled outside this subsystem.
pub async fn increment_penalty(pool: &SqlitePool, member_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INCREMENT_PENALTY)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
