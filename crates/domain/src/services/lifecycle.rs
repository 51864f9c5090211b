//! Card lifecycle policy.
//!
//! Pure functions deciding when a card is delivered and when it is retired.
//! A card without a schedule is sent as soon as possible and kept for 14 days;
//! a scheduled card is kept for 30 days from creation. The first recipient
//! view restarts retention at 14 days from that view.

use chrono::{DateTime, Duration, Utc};

use crate::models::Card;

/// Retention for cards created without a schedule.
pub const SEND_NOW_RETENTION_DAYS: i64 = 14;

/// Retention for cards created with a schedule.
pub const SCHEDULED_RETENTION_DAYS: i64 = 30;

/// Retention after the first view.
pub const VIEWED_RETENTION_DAYS: i64 = 14;

/// Effective schedule and expiry of a new card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialSchedule {
    pub scheduled_send_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

/// Computes the schedule and expiry of a card created at `created_at`.
pub fn compute_initial_schedule(
    scheduled_send_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> InitialSchedule {
    match scheduled_send_date {
        Some(at) => InitialSchedule {
            scheduled_send_date: at,
            expiry_date: created_at + Duration::days(SCHEDULED_RETENTION_DAYS),
        },
        None => InitialSchedule {
            scheduled_send_date: created_at,
            expiry_date: created_at + Duration::days(SEND_NOW_RETENTION_DAYS),
        },
    }
}

/// Expiry computed for a card first viewed at `viewed_at`.
pub fn on_first_view(viewed_at: DateTime<Utc>) -> DateTime<Utc> {
    viewed_at + Duration::days(VIEWED_RETENTION_DAYS)
}

/// Applies one view at `viewed_at` to `card`.
///
/// Always increments the view count. The first view also stamps
/// `first_viewed_date` and extends the expiry; an expiry already later than
/// the viewed window is kept. Callers must hold the card exclusively (row
/// lock or store lock) while applying.
pub fn apply_view(card: &mut Card, viewed_at: DateTime<Utc>) {
    card.view_count += 1;
    if card.first_viewed_date.is_none() {
        card.first_viewed_date = Some(viewed_at);
        card.expiry_date = card.expiry_date.max(on_first_view(viewed_at));
    }
}
