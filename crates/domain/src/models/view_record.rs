//! View record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::validation::{truncate_chars, MAX_IP_ADDRESS_LENGTH, MAX_USER_AGENT_LENGTH};

use super::card::ViewContext;

/// Immutable log entry of one recipient view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub id: Uuid,
    pub card_id: Uuid,
    pub viewed_date: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ViewRecord {
    /// Builds the record for a view of `card_id` at `viewed_date`.
    ///
    /// Request metadata is trimmed to the stored column widths; empty values are dropped.
    pub fn new(card_id: Uuid, viewed_date: DateTime<Utc>, context: &ViewContext) -> Self {
        let clean = |value: &Option<String>, max: usize| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| truncate_chars(v, max))
        };

        Self {
            id: Uuid::new_v4(),
            card_id,
            viewed_date,
            ip_address: clean(&context.ip_address, MAX_IP_ADDRESS_LENGTH),
            user_agent: clean(&context.user_agent, MAX_USER_AGENT_LENGTH),
        }
    }
}
