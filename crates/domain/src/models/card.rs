//! Card domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_not_blank, validate_template_id};

use super::sender::SenderSummary;

/// Maximum length of a card message.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// A personalized greeting card sent from a sender to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
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

impl Card {
    /// Whether the retention window has closed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_date
    }

    /// Whether the delivery scheduler should pick this card up at `now`.
    pub fn is_due_for_delivery(&self, now: DateTime<Utc>) -> bool {
        !self.is_sent && self.scheduled_send_date.is_some_and(|at| at <= now)
    }

    /// Artwork attached to this card.
    pub fn artwork(&self) -> CardArtwork {
        match (&self.custom_art_path, &self.premade_art_id) {
            (Some(path), _) => CardArtwork::Uploaded(path.clone()),
            (None, Some(id)) => CardArtwork::Premade(id.clone()),
            (None, None) => CardArtwork::None,
        }
    }

    /// Marks the card as delivered at `at`.
    pub fn mark_sent(&mut self, at: DateTime<Utc>) {
        self.is_sent = true;
        self.sent_date = Some(at);
    }
}

/// Artwork reference of a card: at most one of an upload or a premade template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardArtwork {
    None,
    Uploaded(String),
    Premade(String),
}

/// Card with the public details of its sender.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithSender {
    #[serde(flatten)]
    pub card: Card,
    pub sender: SenderSummary,
}

/// Request payload for card creation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[validate(length(min = 1, max = 200, message = "Sender name must be 1-200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub sender_name: String,

    #[validate(email(message = "Sender email must be a valid email address"))]
    #[validate(length(max = 200, message = "Sender email cannot exceed 200 characters"))]
    pub sender_email: String,

    #[validate(length(min = 1, max = 200, message = "Recipient name must be 1-200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub recipient_name: String,

    #[validate(email(message = "Recipient email must be a valid email address"))]
    #[validate(length(max = 200, message = "Recipient email cannot exceed 200 characters"))]
    pub recipient_email: String,

    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub message: String,

    #[serde(default)]
    pub scheduled_send_date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(custom(function = "validate_template_id"))]
    pub premade_art_id: Option<String>,
}

/// An uploaded artwork file accompanying a create request.
#[derive(Debug, Clone)]
pub struct ArtworkUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Delivery commit for one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMark {
    pub card_id: Uuid,
    pub sent_at: DateTime<Utc>,
}

/// Request metadata captured with each view.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
