//! Retention sweep: purges expired cards and their artwork.

use std::sync::Arc;

use uuid::Uuid;

use super::artwork::ArtworkStore;
use super::clock::Clock;
use crate::error::CardError;
use crate::store::CardStore;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Cards found expired.
    pub expired: usize,
    /// Rows deleted.
    pub purged: u64,
    /// Uploaded artworks that could not be deleted.
    pub artwork_failures: usize,
}

/// Deletes cards whose retention window has closed.
#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn CardStore>,
    artwork: Arc<dyn ArtworkStore>,
    clock: Arc<dyn Clock>,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn CardStore>,
        artwork: Arc<dyn ArtworkStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            artwork,
            clock,
        }
    }

    /// Runs one sweep.
    ///
    /// Artwork deletion failures are logged and never keep a card alive.
    /// All expired cards and their view records go in one batch.
    pub async fn run_retention_sweep(&self) -> Result<SweepReport, CardError> {
        let now = self.clock.now();
        let expired = self.store.find_expired(now).await?;

        if expired.is_empty() {
            tracing::debug!("No expired ecards to purge");
            return Ok(SweepReport::default());
        }

        let mut artwork_failures = 0;
        for card in &expired {
            let Some(path) = &card.custom_art_path else {
                continue;
            };
            if let Err(e) = self.artwork.delete(path).await {
                artwork_failures += 1;
                let err = CardError::ArtworkDelete(e);
                tracing::warn!(card_id = %card.id, path = %path, error = %err, "Failed to delete artwork of expired ecard");
            }
        }

        let ids: Vec<Uuid> = expired.iter().map(|c| c.id).collect();
        let purged = self.store.delete_cards(&ids).await?;

        tracing::info!(
            expired = expired.len(),
            purged,
            artwork_failures,
            "Retention sweep deleted expired ecards"
        );

        Ok(SweepReport {
            expired: expired.len(),
            purged,
            artwork_failures,
        })
    }
}
