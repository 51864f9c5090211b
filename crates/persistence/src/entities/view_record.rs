//! View record entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::ViewRecord;

/// Database row mapping for the view_records table.
#[derive(Debug, Clone, FromRow)]
pub struct ViewRecordEntity {
    pub id: Uuid,
    pub card_id: Uuid,
    pub viewed_date: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<ViewRecordEntity> for ViewRecord {
    fn from(entity: ViewRecordEntity) -> Self {
        Self {
            id: entity.id,
            card_id: entity.card_id,
            viewed_date: entity.viewed_date,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
        }
    }
}
