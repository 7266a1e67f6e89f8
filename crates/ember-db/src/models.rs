/// Database row types — these map directly to SQLite rows.
/// Distinct from the ember-types API models to keep the DB layer independent.

pub struct UserRow {
    pub telegram_user_id: i64,
    pub first_name: String,
    pub username: String,
    /// JSON array of photo URLs, as stored.
    pub photos: String,
    pub description: String,
    pub language: String,
    pub theme: String,
    pub film_grain: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

pub struct MatchRow {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub kind: String,
    pub confirm_1: bool,
    pub confirm_2: bool,
    pub created_at: i64,
}

impl MatchRow {
    pub fn is_member(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    pub fn both_confirmed(&self) -> bool {
        self.confirm_1 && self.confirm_2
    }
}

/// Match row joined with both members' display columns, for list views.
pub struct MatchPartnerRow {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub kind: String,
    pub confirm_1: bool,
    pub confirm_2: bool,
    pub created_at: i64,
    pub user1_name: String,
    pub user1_photos: String,
    pub user2_name: String,
    pub user2_photos: String,
}

pub struct MessageRow {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub kind: String,
    pub content: String,
    pub blurred: bool,
    pub timestamp: i64,
}

/// Already-validated partial profile update. `None` leaves a column as is.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub photos: Option<Vec<String>>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub theme: Option<String>,
    pub film_grain: Option<bool>,
}

pub enum AddPhotoOutcome {
    Added(Vec<String>),
    CapReached,
    NoSuchUser,
}
