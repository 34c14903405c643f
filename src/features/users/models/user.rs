use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Internal user record, keyed by the identity provider's token identifier
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    /// `"{issuer}|{subject}"` of the identity that owns this record
    pub token_identifier: String,
    pub name: String,
    pub image: Option<String>,
    /// Organizations this user belongs to
    pub org_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_member_of(&self, org_id: &str) -> bool {
        self.org_ids.iter().any(|id| id == org_id)
    }
}
