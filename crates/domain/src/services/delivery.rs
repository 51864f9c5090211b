//! Scheduled delivery: notifies recipients of due cards.

use std::sync::Arc;

use super::clock::Clock;
use super::notification::NotificationSender;
use crate::error::CardError;
use crate::models::SentMark;
use crate::store::CardStore;

/// Outcome of one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Cards found due.
    pub due: usize,
    /// Notifications accepted by the transport.
    pub sent: usize,
    /// Notifications that failed; those cards stay due.
    pub failed: usize,
    /// Cards actually marked sent by the final write.
    pub committed: u64,
}

/// Delivers due-but-unsent cards.
#[derive(Clone)]
pub struct DeliveryScheduler {
    store: Arc<dyn CardStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
}

impl DeliveryScheduler {
    pub fn new(
        store: Arc<dyn CardStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Runs one delivery pass.
    ///
    /// Only cards whose notification succeeded are marked sent, all in a
    /// single write at the end of the pass. A failed card is left untouched
    /// and picked up again by the next pass.
    pub async fn run_delivery_pass(&self) -> Result<DeliveryReport, CardError> {
        let due = self.store.find_due_for_delivery(self.clock.now()).await?;
        if due.is_empty() {
            tracing::debug!("No ecards due for delivery");
            return Ok(DeliveryReport::default());
        }

        let mut marks = Vec::with_capacity(due.len());
        let mut failed = 0;

        for (card, sender) in &due {
            match self.notifier.send(card, sender).await {
                Ok(()) => {
                    marks.push(SentMark {
                        card_id: card.id,
                        sent_at: self.clock.now(),
                    });
                    tracing::info!(card_id = %card.id, recipient = %card.recipient_email, "Sent ecard");
                }
                Err(e) => {
                    failed += 1;
                    let err = CardError::Delivery(e);
                    tracing::error!(
                        card_id = %card.id,
                        recipient = %card.recipient_email,
                        error = %err,
                        "Failed to send ecard, will retry on next run"
                    );
                }
            }
        }

        let committed = if marks.is_empty() {
            0
        } else {
            self.store.mark_sent(&marks).await?
        };

        if committed < marks.len() as u64 {
            tracing::debug!(
                sent = marks.len(),
                committed,
                "Some delivered ecards were removed or sent before commit"
            );
        }

        if marks.is_empty() {
            tracing::warn!(failed, "Delivery pass complete: all ecards failed to send");
        } else {
            tracing::info!(sent = marks.len(), failed, "Delivery pass complete");
        }

        Ok(DeliveryReport {
            due: due.len(),
            sent: marks.len(),
            failed,
            committed,
        })
    }
}
