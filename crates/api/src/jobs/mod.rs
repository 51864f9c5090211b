//! Background job scheduler and job implementations.

mod delivery_pass;
mod pool_metrics;
mod retention_sweep;
mod scheduler;

pub use delivery_pass::DeliveryPassJob;
pub use pool_metrics::PoolMetricsJob;
pub use retention_sweep::RetentionSweepJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
