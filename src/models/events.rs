// Event rows. `date` and `registration_opening_date` are stored as
// "%Y-%m-%d %H:%M:%S" TEXT and parsed in the services that need real
// date arithmetic.
#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: String,
    pub title: String,
    pub date: String,
    pub address: String,
    pub description: String,
    pub price: i64,
    pub duration: Option<i64>,
    pub public: i64,
    pub binding_registration: i64,
    pub transportation: i64,
    pub food: i64,
    pub extra_information: Option<String>,
    pub max_participants: Option<i64>,
    pub room_number: Option<String>,
    pub building: Option<String>,
    pub registration_opening_date: Option<String>,
    // meaningful only when binding_registration is set
    pub confirmed: i64,
    pub host: String,
}

impl EventRow {
    pub fn is_public(&self) -> bool {
        self.public != 0
    }

    pub fn is_binding(&self) -> bool {
        self.binding_registration != 0
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed != 0
    }
}
