//! Domain services for eCards.
//!
//! Services contain the card lifecycle logic and depend only on the
//! collaborator traits, never on concrete storage or transport.

pub mod artwork;
pub mod cards;
pub mod clock;
pub mod delivery;
pub mod lifecycle;
pub mod notification;
pub mod retention;
pub mod templates;
pub mod views;

pub use artwork::{ArtworkError, ArtworkStore, MemoryArtworkStore};
pub use cards::CardService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::{DeliveryReport, DeliveryScheduler};
pub use notification::{
    notification_variables, DeliveryError, MockNotificationSender, NotificationSender,
    NOTIFICATION_TEMPLATE,
};
pub use retention::{RetentionSweeper, SweepReport};
pub use templates::TemplateService;
pub use views::ViewRecorder;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::{CreateCardRequest, ViewContext};
    use crate::store::{CardStore, InMemoryCardStore};

    #[tokio::test]
    async fn test_birthday_card_lifecycle() {
        let t0 = Utc::now();
        let store = Arc::new(InMemoryCardStore::new());
        let artwork = Arc::new(MemoryArtworkStore::new());
        let notifier = Arc::new(MockNotificationSender::new());
        let clock = Arc::new(ManualClock::new(t0));

        let cards = CardService::new(
            store.clone(),
            artwork.clone(),
            notifier.clone(),
            clock.clone(),
            5 * 1024 * 1024,
        );
        let delivery = DeliveryScheduler::new(store.clone(), notifier.clone(), clock.clone());
        let views = ViewRecorder::new(store.clone(), clock.clone());
        let sweeper = RetentionSweeper::new(store.clone(), artwork.clone(), clock.clone());

        let card = cards
            .create_card(
                CreateCardRequest {
                    sender_name: "Alice".to_string(),
                    sender_email: "alice@example.com".to_string(),
                    recipient_name: "Bob".to_string(),
                    recipient_email: "bob@example.com".to_string(),
                    message: "Happy Birthday!".to_string(),
                    scheduled_send_date: None,
                    premade_art_id: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(card.scheduled_send_date, Some(t0));
        assert_eq!(card.expiry_date, t0 + Duration::days(14));
        assert!(card.is_due_for_delivery(clock.now()));

        let report = delivery.run_delivery_pass().await.unwrap();
        assert_eq!(report.sent, 1);
        let delivered = store.find_card(card.id).await.unwrap().unwrap();
        assert!(delivered.is_sent);
        assert_eq!(delivered.sent_date, Some(t0));

        clock.set(t0 + Duration::days(1));
        let first = views
            .record_view(card.id, ViewContext::default())
            .await
            .unwrap();
        assert_eq!(first.first_viewed_date, Some(t0 + Duration::days(1)));
        assert_eq!(first.expiry_date, t0 + Duration::days(15));
        assert_eq!(first.view_count, 1);

        clock.advance(Duration::hours(3));
        let second = views
            .record_view(card.id, ViewContext::default())
            .await
            .unwrap();
        assert_eq!(second.view_count, 2);
        assert_eq!(second.first_viewed_date, first.first_viewed_date);
        assert_eq!(second.expiry_date, first.expiry_date);
        assert_eq!(second.sent_date, Some(t0));

        // the creation-time 14 day window has passed, the extended one has not
        clock.set(t0 + Duration::days(14));
        assert_eq!(sweeper.run_retention_sweep().await.unwrap().purged, 0);

        clock.set(t0 + Duration::days(15));
        assert_eq!(sweeper.run_retention_sweep().await.unwrap().purged, 1);
        assert!(store.find_card(card.id).await.unwrap().is_none());
        assert_eq!(store.view_count_for(card.id), 0);
    }
}
