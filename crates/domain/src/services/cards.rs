//! Card service: creation, lookup, resend and admin deletion.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use shared::validation::emails_match;

use super::artwork::{ArtworkError, ArtworkStore};
use super::clock::Clock;
use super::lifecycle::compute_initial_schedule;
use super::notification::NotificationSender;
use crate::error::CardError;
use crate::models::{ArtworkUpload, Card, CardWithSender, CreateCardRequest, Sender, ViewRecord};
use crate::store::CardStore;

/// Default page size of the admin card listing.
pub const DEFAULT_CARD_LISTING: i64 = 100;

/// Default page size of the admin view audit listing.
pub const DEFAULT_VIEW_LISTING: i64 = 200;

const MAX_LISTING: i64 = 1000;

/// Card operations used by the HTTP layer.
#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn CardStore>,
    artwork: Arc<dyn ArtworkStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    max_upload_bytes: usize,
}

impl CardService {
    pub fn new(
        store: Arc<dyn CardStore>,
        artwork: Arc<dyn ArtworkStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            artwork,
            notifier,
            clock,
            max_upload_bytes,
        }
    }

    /// Creates a card, finding or creating its sender by email.
    ///
    /// An uploaded artwork is stored first and removed again if the card
    /// cannot be persisted.
    pub async fn create_card(
        &self,
        request: CreateCardRequest,
        upload: Option<ArtworkUpload>,
    ) -> Result<Card, CardError> {
        request.validate()?;

        if upload.is_some() && request.premade_art_id.is_some() {
            return Err(CardError::Validation(
                "Choose either custom artwork or a premade template, not both".to_string(),
            ));
        }
        if let Some(upload) = &upload {
            if upload.bytes.is_empty() {
                return Err(CardError::Validation("Uploaded artwork is empty".to_string()));
            }
            if upload.bytes.len() > self.max_upload_bytes {
                return Err(CardError::Validation(
                    ArtworkError::TooLarge {
                        size: upload.bytes.len(),
                        limit: self.max_upload_bytes,
                    }
                    .to_string(),
                ));
            }
        }

        let now = self.clock.now();
        let schedule = compute_initial_schedule(request.scheduled_send_date, now);

        let custom_art_path = match &upload {
            Some(upload) => Some(
                self.artwork
                    .save(&upload.file_name, &upload.bytes)
                    .await
                    .map_err(CardError::ArtworkStorage)?,
            ),
            None => None,
        };

        let sender = Sender::new(
            request.sender_name.trim(),
            request.sender_email.trim(),
            now,
        );
        let card = Card {
            id: Uuid::new_v4(),
            sender_id: sender.id,
            recipient_name: request.recipient_name.trim().to_string(),
            recipient_email: request.recipient_email.trim().to_string(),
            message: request.message,
            custom_art_path: custom_art_path.clone(),
            premade_art_id: request.premade_art_id,
            scheduled_send_date: Some(schedule.scheduled_send_date),
            is_sent: false,
            sent_date: None,
            created_date: now,
            first_viewed_date: None,
            view_count: 0,
            expiry_date: schedule.expiry_date,
        };

        let (card, sender) = match self.store.insert_card(sender, card).await {
            Ok(stored) => stored,
            Err(e) => {
                if let Some(path) = custom_art_path {
                    if let Err(cleanup) = self.artwork.delete(&path).await {
                        tracing::warn!(path = %path, error = %cleanup, "Failed to remove orphaned artwork");
                    }
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            card_id = %card.id,
            sender_id = %sender.id,
            scheduled_send_date = %schedule.scheduled_send_date,
            expiry_date = %card.expiry_date,
            "Created ecard"
        );

        Ok(card)
    }

    /// Card with its sender.
    pub async fn get_card(&self, id: Uuid) -> Result<CardWithSender, CardError> {
        self.store
            .find_card_with_sender(id)
            .await?
            .ok_or_else(|| CardError::NotFound("eCard".to_string()))
    }

    /// Cards of the sender with `email`, newest first.
    ///
    /// `requester_email` is the caller's verified email and must match `email`.
    /// An unknown sender has no cards.
    pub async fn cards_for_sender(
        &self,
        email: &str,
        requester_email: Option<&str>,
    ) -> Result<Vec<Card>, CardError> {
        if email.trim().is_empty() {
            return Err(CardError::Validation("Email is required".to_string()));
        }
        if !requester_email.is_some_and(|r| emails_match(r, email)) {
            return Err(CardError::Forbidden(
                "Email does not match the signed-in user".to_string(),
            ));
        }

        match self.store.find_sender_by_email(email).await? {
            Some(sender) => Ok(self.store.list_cards_for_sender(sender.id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Sends the notification for a card immediately, whether or not it was sent before.
    ///
    /// With `owner_email` set, the card's sender must have that email.
    /// The card is marked sent only after the transport accepted the message.
    pub async fn resend_card(&self, id: Uuid, owner_email: Option<&str>) -> Result<Card, CardError> {
        let CardWithSender { card, sender } = self.get_card(id).await?;

        if let Some(owner) = owner_email {
            if !emails_match(owner, &sender.email) {
                return Err(CardError::Forbidden(
                    "Only the sender can resend this eCard".to_string(),
                ));
            }
        }

        let sender = self
            .store
            .find_sender_by_email(&sender.email)
            .await?
            .ok_or_else(|| CardError::NotFound("Sender".to_string()))?;

        if let Err(e) = self.notifier.send(&card, &sender).await {
            tracing::warn!(card_id = %card.id, error = %e, "Resend failed");
            return Err(e.into());
        }

        let sent_at = self.clock.now();
        if !self.store.set_sent(card.id, sent_at).await? {
            return Err(CardError::NotFound("eCard".to_string()));
        }

        tracing::info!(card_id = %card.id, recipient = %card.recipient_email, "Resent ecard");

        let mut card = card;
        card.mark_sent(sent_at);
        Ok(card)
    }

    /// Newest cards with senders. `take` defaults to 100.
    pub async fn list_recent(&self, take: Option<i64>) -> Result<Vec<CardWithSender>, CardError> {
        let take = clamp_take(take, DEFAULT_CARD_LISTING);
        Ok(self.store.list_recent_cards(take).await?)
    }

    /// Newest view records. `take` defaults to 200.
    pub async fn list_recent_views(&self, take: Option<i64>) -> Result<Vec<ViewRecord>, CardError> {
        let take = clamp_take(take, DEFAULT_VIEW_LISTING);
        Ok(self.store.list_recent_views(take).await?)
    }

    /// Deletes a card and its view records. Uploaded artwork removal is best effort.
    pub async fn delete_card(&self, id: Uuid) -> Result<(), CardError> {
        let card = self
            .store
            .find_card(id)
            .await?
            .ok_or_else(|| CardError::NotFound("eCard".to_string()))?;

        if let Some(path) = &card.custom_art_path {
            if let Err(e) = self.artwork.delete(path).await {
                let err = CardError::ArtworkDelete(e);
                tracing::warn!(card_id = %id, path = %path, error = %err, "Continuing without artwork cleanup");
            }
        }

        let deleted = self.store.delete_cards(&[id]).await?;
        tracing::info!(card_id = %id, deleted, "Admin deleted ecard");
        Ok(())
    }

    /// Uploaded artwork of a card as `(path, bytes)`.
    pub async fn open_artwork(&self, id: Uuid) -> Result<(String, Vec<u8>), CardError> {
        let card = self
            .store
            .find_card(id)
            .await?
            .ok_or_else(|| CardError::NotFound("eCard".to_string()))?;

        let path = card
            .custom_art_path
            .ok_or_else(|| CardError::NotFound("Custom artwork".to_string()))?;

        match self.artwork.open(&path).await {
            Ok(bytes) => Ok((path, bytes)),
            Err(ArtworkError::NotFound(_)) => Err(CardError::NotFound("Artwork file".to_string())),
            Err(e) => Err(CardError::ArtworkStorage(e)),
        }
    }
}

fn clamp_take(take: Option<i64>, default: i64) -> i64 {
    take.unwrap_or(default).clamp(1, MAX_LISTING)
}
