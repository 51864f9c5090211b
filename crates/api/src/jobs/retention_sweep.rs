//! Background job that purges expired cards.

use domain::services::RetentionSweeper;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_cards_purged;

pub struct RetentionSweepJob {
    sweeper: RetentionSweeper,
    frequency: JobFrequency,
}

impl RetentionSweepJob {
    pub fn new(sweeper: RetentionSweeper, interval_secs: u64) -> Self {
        Self {
            sweeper,
            frequency: JobFrequency::from_secs(interval_secs),
        }
    }
}

#[async_trait::async_trait]
impl Job for RetentionSweepJob {
    fn name(&self) -> &'static str {
        "retention_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> Result<(), String> {
        let report = self
            .sweeper
            .run_retention_sweep()
            .await
            .map_err(|e| format!("Retention sweep failed: {}", e))?;

        record_cards_purged(report.purged, report.artwork_failures);
        if report.purged > 0 {
            tracing::info!(
                expired = report.expired,
                purged = report.purged,
                artwork_failures = report.artwork_failures,
                "Purged expired ecards"
            );
        }
        Ok(())
    }
}
