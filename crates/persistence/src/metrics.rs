//! Database metrics collection.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Records the duration of one query.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("ecards_db_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Records connection pool gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("ecards_db_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("ecards_db_connections_idle").set(idle as f64);
    gauge!("ecards_db_connections_total").set(size as f64);
}

/// Times a query from creation until [`QueryTimer::record`].
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("find_card_by_id");
        assert_eq!(timer.query_name, "find_card_by_id");
        timer.record();
    }
}
