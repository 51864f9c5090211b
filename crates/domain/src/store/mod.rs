//! Storage collaborators.
//!
//! The card store is the only source of truth for card state. Operations that
//! mutate more than one row run in a single transaction.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Card, CardWithSender, PremadeTemplate, Sender, SentMark, ViewRecord};

pub use memory::InMemoryCardStore;

/// Durable storage of cards, senders and view records.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_card(&self, id: Uuid) -> Result<Option<Card>, StoreError>;

    async fn find_card_with_sender(&self, id: Uuid) -> Result<Option<CardWithSender>, StoreError>;

    /// Case-insensitive lookup of a sender by email.
    async fn find_sender_by_email(&self, email: &str) -> Result<Option<Sender>, StoreError>;

    /// Inserts `card`, attaching it to the sender with the same email as
    /// `sender` (case-insensitive) or inserting `sender` when none exists.
    ///
    /// Returns the stored card and the sender it belongs to.
    async fn insert_card(&self, sender: Sender, card: Card) -> Result<(Card, Sender), StoreError>;

    /// Cards of one sender, newest first.
    async fn list_cards_for_sender(&self, sender_id: Uuid) -> Result<Vec<Card>, StoreError>;

    /// Newest cards with their senders.
    async fn list_recent_cards(&self, limit: i64) -> Result<Vec<CardWithSender>, StoreError>;

    /// Newest view records.
    async fn list_recent_views(&self, limit: i64) -> Result<Vec<ViewRecord>, StoreError>;

    /// Cards with `expiry_date <= now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Card>, StoreError>;

    /// Unsent cards whose scheduled send date is at or before `now`, with their senders.
    async fn find_due_for_delivery(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Card, Sender)>, StoreError>;

    /// Records one view of `record.card_id`.
    ///
    /// Locks the card, applies [`lifecycle::apply_view`](crate::services::lifecycle::apply_view)
    /// at `record.viewed_date`, inserts the record and persists the card in one
    /// transaction. Returns `None` when the card does not exist.
    async fn record_view(&self, record: ViewRecord) -> Result<Option<Card>, StoreError>;

    /// Marks the given cards as sent in one write.
    ///
    /// Only cards that are still unsent are updated. Returns the number of
    /// updated rows; marks for cards that no longer exist are skipped.
    async fn mark_sent(&self, marks: &[SentMark]) -> Result<u64, StoreError>;

    /// Sets `is_sent` and `sent_date` unconditionally. Returns `false` when the card is gone.
    async fn set_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Deletes the given cards and their view records in one transaction.
    async fn delete_cards(&self, ids: &[Uuid]) -> Result<u64, StoreError>;
}

/// Storage of premade artwork templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Active templates ordered by `sort_order`.
    async fn list_active(&self) -> Result<Vec<PremadeTemplate>, StoreError>;

    async fn find_active(&self, id: &str) -> Result<Option<PremadeTemplate>, StoreError>;

    async fn insert_template(&self, template: PremadeTemplate)
        -> Result<PremadeTemplate, StoreError>;

    /// Replaces all fields of an existing template. Returns `false` when absent.
    async fn update_template(&self, template: PremadeTemplate) -> Result<bool, StoreError>;

    /// Sets `is_active = false`. Returns `false` when absent.
    async fn deactivate_template(&self, id: &str) -> Result<bool, StoreError>;
}
