//! Card notification delivery.
//!
//! Provides the abstraction the delivery scheduler and resend use to tell a
//! recipient that a card is waiting.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Card, Sender};

/// Name of the notification template rendered for every card.
pub const NOTIFICATION_TEMPLATE: &str = "ecard-notification";

/// Error type for notification delivery.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Notification not configured: {0}")]
    NotConfigured(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Notification sender trait for telling recipients about their cards.
#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends the notification for `card` from `sender`.
    ///
    /// Success means the transport accepted the message.
    async fn send(&self, card: &Card, sender: &Sender) -> Result<(), DeliveryError>;
}

/// Template variables for the notification of `card`.
///
/// `view_url` is `{frontend_url}/view/{card_id}`.
pub fn notification_variables(
    card: &Card,
    sender: &Sender,
    frontend_url: &str,
    app_name: &str,
) -> BTreeMap<&'static str, String> {
    let view_url = format!("{}/view/{}", frontend_url.trim_end_matches('/'), card.id);

    BTreeMap::from([
        ("RecipientName", card.recipient_name.clone()),
        ("SenderName", sender.name.clone()),
        ("SenderEmail", sender.email.clone()),
        ("CardMessage", card.message.clone()),
        ("ViewUrl", view_url),
        ("AppName", app_name.to_string()),
    ])
}

/// Mock notification sender for development and testing.
///
/// Logs notifications but doesn't actually send them.
#[derive(Debug, Default)]
pub struct MockNotificationSender {
    /// Whether to simulate failures for every card.
    pub simulate_failure: bool,
    failing_cards: Mutex<HashSet<Uuid>>,
    sent: Mutex<Vec<Uuid>>,
}

impl MockNotificationSender {
    /// Create a new mock notification sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sender that fails every delivery.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Makes deliveries of `card_id` fail (or succeed again).
    pub fn set_failing_for(&self, card_id: Uuid, failing: bool) {
        let mut cards = self.failing_cards.lock().unwrap_or_else(|e| e.into_inner());
        if failing {
            cards.insert(card_id);
        } else {
            cards.remove(&card_id);
        }
    }

    /// Ids of cards delivered so far, in order.
    pub fn sent(&self) -> Vec<Uuid> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send(&self, card: &Card, sender: &Sender) -> Result<(), DeliveryError> {
        let fail_this = self
            .failing_cards
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&card.id);

        if self.simulate_failure || fail_this {
            tracing::warn!(
                card_id = %card.id,
                "Mock notification sender simulating failure"
            );
            return Err(DeliveryError::Transport("Simulated failure".to_string()));
        }

        tracing::info!(
            card_id = %card.id,
            recipient = %card.recipient_email,
            sender = %sender.email,
            "Mock: Would send ecard notification"
        );
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(card.id);

        Ok(())
    }
}
