use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i64;
pub type GuestId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub refresh_token_expiry: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A not-yet-persisted user; the directory assigns `id` on create.
    pub fn new(phone: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            phone,
            first_name: String::new(),
            last_name: String::new(),
            refresh_token: None,
            refresh_token_expiry: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_deactivated(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn has_valid_refresh_token(&self, now: DateTime<Utc>) -> bool {
        match (&self.refresh_token, self.refresh_token_expiry) {
            (Some(token), Some(expiry)) => !token.is_empty() && expiry >= now,
            _ => false,
        }
    }
}
