//! Sender entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Sender;

/// Database row mapping for the senders table.
#[derive(Debug, Clone, FromRow)]
pub struct SenderEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_date: DateTime<Utc>,
}

impl From<SenderEntity> for Sender {
    fn from(entity: SenderEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            created_date: entity.created_date,
        }
    }
}
