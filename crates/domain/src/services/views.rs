//! View recording on the public card page.

use std::sync::Arc;

use uuid::Uuid;

use super::clock::Clock;
use crate::error::CardError;
use crate::models::{Card, ViewContext, ViewRecord};
use crate::store::CardStore;

/// Records recipient views.
#[derive(Clone)]
pub struct ViewRecorder {
    store: Arc<dyn CardStore>,
    clock: Arc<dyn Clock>,
}

impl ViewRecorder {
    pub fn new(store: Arc<dyn CardStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records one view of `card_id` and returns the updated card.
    ///
    /// Every call counts; the first one also restarts retention.
    pub async fn record_view(&self, card_id: Uuid, context: ViewContext) -> Result<Card, CardError> {
        let now = self.clock.now();
        let record = ViewRecord::new(card_id, now, &context);

        let card = self
            .store
            .record_view(record)
            .await?
            .ok_or_else(|| CardError::NotFound("eCard".to_string()))?;

        tracing::info!(
            card_id = %card.id,
            view_count = card.view_count,
            expiry_date = %card.expiry_date,
            "ECard viewed"
        );

        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;
    use crate::services::clock::ManualClock;
    use crate::services::lifecycle::compute_initial_schedule;
    use crate::store::InMemoryCardStore;
    use chrono::{DateTime, Duration, Utc};

    async fn seed(store: &InMemoryCardStore, created: DateTime<Utc>) -> Card {
        let sender = Sender::new("Alice", "alice@example.com", created);
        let schedule = compute_initial_schedule(None, created);
        let card = Card {
            id: Uuid::new_v4(),
            sender_id: sender.id,
            recipient_name: "Bob".to_string(),
            recipient_email: "bob@example.com".to_string(),
            message: "Happy Birthday!".to_string(),
            custom_art_path: None,
            premade_art_id: None,
            scheduled_send_date: Some(schedule.scheduled_send_date),
            is_sent: false,
            sent_date: None,
            created_date: created,
            first_viewed_date: None,
            view_count: 0,
            expiry_date: schedule.expiry_date,
        };
        store.insert_card(sender, card).await.unwrap().0
    }

    #[tokio::test]
    async fn test_first_view_extends_expiry_then_counts_only() {
        let created = Utc::now();
        let store = Arc::new(InMemoryCardStore::new());
        let clock = Arc::new(ManualClock::new(created));
        let recorder = ViewRecorder::new(store.clone(), clock.clone());
        let card = seed(&store, created).await;

        clock.advance(Duration::days(1));
        let viewed = recorder
            .record_view(card.id, ViewContext::default())
            .await
            .unwrap();
        assert_eq!(viewed.view_count, 1);
        assert_eq!(viewed.first_viewed_date, Some(created + Duration::days(1)));
        assert_eq!(viewed.expiry_date, created + Duration::days(15));

        clock.advance(Duration::days(2));
        let again = recorder
            .record_view(card.id, ViewContext::default())
            .await
            .unwrap();
        assert_eq!(again.view_count, 2);
        assert_eq!(again.first_viewed_date, viewed.first_viewed_date);
        assert_eq!(again.expiry_date, viewed.expiry_date);
        assert_eq!(store.view_count_for(card.id), 2);
    }

    #[tokio::test]
    async fn test_unknown_card_is_not_found() {
        let recorder = ViewRecorder::new(
            Arc::new(InMemoryCardStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
        );
        let result = recorder
            .record_view(Uuid::new_v4(), ViewContext::default())
            .await;
        assert!(matches!(result, Err(CardError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let store = Arc::new(InMemoryCardStore::new());
        let recorder = ViewRecorder::new(store.clone(), Arc::new(ManualClock::new(Utc::now())));
        let card = seed(&store, Utc::now()).await;
        store.set_unavailable(true);

        let result = recorder.record_view(card.id, ViewContext::default()).await;
        assert!(matches!(result, Err(CardError::Storage(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_views_are_all_counted() {
        let created = Utc::now();
        let store = Arc::new(InMemoryCardStore::new());
        let recorder = ViewRecorder::new(store.clone(), Arc::new(ManualClock::new(created)));
        let card = seed(&store, created).await;

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let recorder = recorder.clone();
                tokio::spawn(async move {
                    let context = ViewContext {
                        ip_address: Some(format!("10.0.0.{}", i)),
                        user_agent: Some("test-agent".to_string()),
                    };
                    recorder.record_view(card.id, context).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.find_card(card.id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 50);
        assert_eq!(stored.first_viewed_date, Some(created));
        assert_eq!(store.view_count_for(card.id), 50);
    }
}
