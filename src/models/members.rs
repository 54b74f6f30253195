// Member rows. The participation engine only reads `id`, `email`, `role`
// and `penalty` and only ever writes `penalty`; the rest belongs to the
// membership subsystem and rides along as profile snapshot material.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberRow {
    pub id: String,
    pub real_name: String,
    pub email: String,
    pub classof: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    // 0 = clean, 1 = warning, >= 2 = deprioritized on every roster
    pub penalty: i64,
}

impl MemberRow {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}
