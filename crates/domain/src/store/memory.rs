//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::validation::emails_match;

use super::{CardStore, TemplateStore};
use crate::error::StoreError;
use crate::models::{
    Card, CardWithSender, PremadeTemplate, Sender, SenderSummary, SentMark, ViewRecord,
};
use crate::services::lifecycle;

#[derive(Debug, Default)]
struct Tables {
    cards: HashMap<Uuid, Card>,
    senders: HashMap<Uuid, Sender>,
    views: Vec<ViewRecord>,
    templates: HashMap<String, PremadeTemplate>,
    unavailable: bool,
}

impl Tables {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_sender(&self, card: &Card) -> Result<CardWithSender, StoreError> {
        let sender = self.senders.get(&card.sender_id).ok_or_else(|| {
            StoreError::Unavailable(format!("sender {} missing", card.sender_id))
        })?;
        Ok(CardWithSender {
            card: card.clone(),
            sender: SenderSummary::from(sender.clone()),
        })
    }
}

/// [`CardStore`] and [`TemplateStore`] backed by process memory.
///
/// Every operation runs under one process-wide lock, which makes each call a
/// transaction.
#[derive(Debug, Default)]
pub struct InMemoryCardStore {
    tables: Mutex<Tables>,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of view records stored for `card_id`.
    pub fn view_count_for(&self, card_id: Uuid) -> usize {
        self.lock()
            .views
            .iter()
            .filter(|v| v.card_id == card_id)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means a test panicked mid-call; the tables stay usable.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().check()
    }

    async fn find_card(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        Ok(tables.cards.get(&id).cloned())
    }

    async fn find_card_with_sender(&self, id: Uuid) -> Result<Option<CardWithSender>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        tables
            .cards
            .get(&id)
            .map(|card| tables.with_sender(card))
            .transpose()
    }

    async fn find_sender_by_email(&self, email: &str) -> Result<Option<Sender>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        Ok(tables
            .senders
            .values()
            .find(|s| emails_match(&s.email, email))
            .cloned())
    }

    async fn insert_card(&self, sender: Sender, mut card: Card) -> Result<(Card, Sender), StoreError> {
        let mut tables = self.lock();
        tables.check()?;

        let existing = tables
            .senders
            .values()
            .find(|s| emails_match(&s.email, &sender.email))
            .cloned();
        let sender = match existing {
            Some(existing) => existing,
            None => {
                tables.senders.insert(sender.id, sender.clone());
                sender
            }
        };

        card.sender_id = sender.id;
        if tables.cards.contains_key(&card.id) {
            return Err(StoreError::Conflict(format!("card {} exists", card.id)));
        }
        tables.cards.insert(card.id, card.clone());
        Ok((card, sender))
    }

    async fn list_cards_for_sender(&self, sender_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        let mut cards: Vec<Card> = tables
            .cards
            .values()
            .filter(|c| c.sender_id == sender_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        Ok(cards)
    }

    async fn list_recent_cards(&self, limit: i64) -> Result<Vec<CardWithSender>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        let mut cards: Vec<&Card> = tables.cards.values().collect();
        cards.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        cards
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|c| tables.with_sender(c))
            .collect()
    }

    async fn list_recent_views(&self, limit: i64) -> Result<Vec<ViewRecord>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        let mut views = tables.views.clone();
        views.sort_by(|a, b| b.viewed_date.cmp(&a.viewed_date));
        views.truncate(limit.max(0) as usize);
        Ok(views)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Card>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        Ok(tables
            .cards
            .values()
            .filter(|c| c.is_expired(now))
            .cloned()
            .collect())
    }

    async fn find_due_for_delivery(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Card, Sender)>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        let mut due: Vec<(Card, Sender)> = tables
            .cards
            .values()
            .filter(|c| c.is_due_for_delivery(now))
            .filter_map(|c| {
                tables
                    .senders
                    .get(&c.sender_id)
                    .map(|s| (c.clone(), s.clone()))
            })
            .collect();
        due.sort_by(|a, b| a.0.scheduled_send_date.cmp(&b.0.scheduled_send_date));
        Ok(due)
    }

    async fn record_view(&self, record: ViewRecord) -> Result<Option<Card>, StoreError> {
        let mut tables = self.lock();
        tables.check()?;

        let Some(card) = tables.cards.get_mut(&record.card_id) else {
            return Ok(None);
        };
        lifecycle::apply_view(card, record.viewed_date);
        let updated = card.clone();
        tables.views.push(record);
        Ok(Some(updated))
    }

    async fn mark_sent(&self, marks: &[SentMark]) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        tables.check()?;

        let mut updated = 0;
        for mark in marks {
            if let Some(card) = tables.cards.get_mut(&mark.card_id) {
                if !card.is_sent {
                    card.mark_sent(mark.sent_at);
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn set_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        tables.check()?;
        match tables.cards.get_mut(&id) {
            Some(card) => {
                card.mark_sent(sent_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_cards(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        tables.check()?;

        let mut deleted = 0;
        for id in ids {
            if tables.cards.remove(id).is_some() {
                deleted += 1;
            }
        }
        tables.views.retain(|v| !ids.contains(&v.card_id));
        Ok(deleted)
    }
}

#[async_trait]
impl TemplateStore for InMemoryCardStore {
    async fn list_active(&self) -> Result<Vec<PremadeTemplate>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        let mut templates: Vec<PremadeTemplate> = tables
            .templates
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
        Ok(templates)
    }

    async fn find_active(&self, id: &str) -> Result<Option<PremadeTemplate>, StoreError> {
        let tables = self.lock();
        tables.check()?;
        Ok(tables.templates.get(id).filter(|t| t.is_active).cloned())
    }

    async fn insert_template(
        &self,
        template: PremadeTemplate,
    ) -> Result<PremadeTemplate, StoreError> {
        let mut tables = self.lock();
        tables.check()?;
        if tables.templates.contains_key(&template.id) {
            return Err(StoreError::Conflict(format!(
                "template {} exists",
                template.id
            )));
        }
        tables
            .templates
            .insert(template.id.clone(), template.clone());
        Ok(template)
    }

    async fn update_template(&self, template: PremadeTemplate) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        tables.check()?;
        match tables.templates.get_mut(&template.id) {
            Some(existing) => {
                *existing = template;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_template(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        tables.check()?;
        match tables.templates.get_mut(id) {
            Some(existing) => {
                existing.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
