//! Background job that sends notifications for due cards.

use domain::services::DeliveryScheduler;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_cards_delivered;

pub struct DeliveryPassJob {
    scheduler: DeliveryScheduler,
    frequency: JobFrequency,
}

impl DeliveryPassJob {
    pub fn new(scheduler: DeliveryScheduler, interval_secs: u64) -> Self {
        Self {
            scheduler,
            frequency: JobFrequency::from_secs(interval_secs),
        }
    }
}

#[async_trait::async_trait]
impl Job for DeliveryPassJob {
    fn name(&self) -> &'static str {
        "delivery_pass"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> Result<(), String> {
        let report = self
            .scheduler
            .run_delivery_pass()
            .await
            .map_err(|e| format!("Delivery pass failed: {}", e))?;

        record_cards_delivered(report.sent, report.failed);
        if report.due > 0 {
            tracing::info!(
                due = report.due,
                sent = report.sent,
                failed = report.failed,
                committed = report.committed,
                "Delivery pass finished"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use domain::models::{Card, Sender};
    use domain::services::{ManualClock, MockNotificationSender};
    use domain::store::{CardStore, InMemoryCardStore};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_execute_delivers_due_cards() {
        let now = Utc::now();
        let store = Arc::new(InMemoryCardStore::new());
        let notifier = Arc::new(MockNotificationSender::new());
        let sender = Sender::new("Alice", "alice@example.com", now);
        let card = Card {
            id: Uuid::new_v4(),
            sender_id: sender.id,
            recipient_name: "Bob".to_string(),
            recipient_email: "bob@example.com".to_string(),
            message: "Hi".to_string(),
            custom_art_path: None,
            premade_art_id: None,
            scheduled_send_date: Some(now - Duration::minutes(1)),
            is_sent: false,
            sent_date: None,
            created_date: now - Duration::minutes(1),
            first_viewed_date: None,
            view_count: 0,
            expiry_date: now + Duration::days(14),
        };
        store.insert_card(sender, card.clone()).await.unwrap();

        let scheduler = DeliveryScheduler::new(
            store.clone(),
            notifier.clone(),
            Arc::new(ManualClock::new(now)),
        );
        let job = DeliveryPassJob::new(scheduler, 300);
        assert_eq!(job.frequency(), JobFrequency::Minutes(5));

        tokio_test::assert_ok!(job.execute().await);
        assert_eq!(notifier.sent(), vec![card.id]);
        assert!(store.find_card(card.id).await.unwrap().unwrap().is_sent);
    }
}
