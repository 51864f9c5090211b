//! Card entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Card, CardWithSender, Sender, SenderSummary};

/// Database row mapping for the cards table.
#[derive(Debug, Clone, FromRow)]
pub struct CardEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_name: String,
    pub recipient_email: String,
    pub message: String,
    pub custom_art_path: Option<String>,
    pub premade_art_id: Option<String>,
    pub scheduled_send_date: Option<DateTime<Utc>>,
    pub is_sent: bool,
    pub sent_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub first_viewed_date: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub expiry_date: DateTime<Utc>,
}

impl From<CardEntity> for Card {
    fn from(entity: CardEntity) -> Self {
        Self {
            id: entity.id,
            sender_id: entity.sender_id,
            recipient_name: entity.recipient_name,
            recipient_email: entity.recipient_email,
            message: entity.message,
            custom_art_path: entity.custom_art_path,
            premade_art_id: entity.premade_art_id,
            scheduled_send_date: entity.scheduled_send_date,
            is_sent: entity.is_sent,
            sent_date: entity.sent_date,
            created_date: entity.created_date,
            first_viewed_date: entity.first_viewed_date,
            view_count: entity.view_count,
            expiry_date: entity.expiry_date,
        }
    }
}

/// Card row joined with its sender (`s.name AS sender_name`, ...).
#[derive(Debug, Clone, FromRow)]
pub struct CardWithSenderEntity {
    #[sqlx(flatten)]
    pub card: CardEntity,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_created_date: DateTime<Utc>,
}

impl From<CardWithSenderEntity> for CardWithSender {
    fn from(entity: CardWithSenderEntity) -> Self {
        let sender = SenderSummary {
            id: entity.card.sender_id,
            name: entity.sender_name,
            email: entity.sender_email,
        };
        Self {
            card: entity.card.into(),
            sender,
        }
    }
}

impl From<CardWithSenderEntity> for (Card, Sender) {
    fn from(entity: CardWithSenderEntity) -> Self {
        let sender = Sender {
            id: entity.card.sender_id,
            name: entity.sender_name,
            email: entity.sender_email,
            created_date: entity.sender_created_date,
        };
        (entity.card.into(), sender)
    }
}
