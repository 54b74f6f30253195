// High-churn roster rows: one per (event, member), ordered by `position`.
// Profile fields are a snapshot taken at join time; only the `penalty`
// snapshot is kept in sync afterwards, by the penalty engine.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventParticipantRow {
    pub event_id: String,
    pub member_id: String,
    // dense 0-based roster position, 0 = highest priority
    pub position: i64,
    pub real_name: String,
    pub email: String,
    pub classof: String,
    pub phone: Option<String>,
    pub role: String,
    pub food: i64,
    pub transportation: i64,
    pub dietary_restrictions: String,
    pub penalty: i64,
    pub confirmed: Option<i64>,
    pub attended: Option<i64>,
    pub submit_date: String,
}

impl EventParticipantRow {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed == Some(1)
    }

    /// Deprioritized participants are constrained to a contiguous roster tail.
    pub fn is_deprioritized(&self) -> bool {
        self.penalty >= crate::services::roster_order::DEPRIORITIZE_THRESHOLD
    }
}
