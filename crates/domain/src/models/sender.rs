//! Sender domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The author of one or more cards. Repeat senders are matched by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_date: DateTime<Utc>,
}

impl Sender {
    /// Creates a sender with a fresh id.
    pub fn new(name: impl Into<String>, email: impl Into<String>, created_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            created_date,
        }
    }
}

/// Sender details exposed alongside a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<Sender> for SenderSummary {
    fn from(sender: Sender) -> Self {
        Self {
            id: sender.id,
            name: sender.name,
            email: sender.email,
        }
    }
}
