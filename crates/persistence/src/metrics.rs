//! Query and pool metrics for the PostgreSQL stores.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Outcome label for a finished query.
fn outcome_label<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => "unique_violation",
        Err(sqlx::Error::PoolTimedOut) => "pool_timeout",
        Err(_) => "error",
    }
}

/// Snapshot pool usage into gauges. Called from the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_total").set(size as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
}

/// Times one repository statement.
///
/// ```ignore
/// let timer = QueryTimer::new("mark_invite_token_used");
/// let result = sqlx::query_as::<_, InviteTokenEntity>(...).fetch_optional(&pool).await;
/// timer.finish(&result);
/// result
/// ```
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

    /// Record the duration and count the statement under its outcome.
    pub fn finish<T>(self, result: &Result<T, sqlx::Error>) {
        let outcome = outcome_label(result);
        histogram!("database_query_duration_seconds", "query" => self.query_name)
            .record(self.start.elapsed().as_secs_f64());
        counter!(
            "database_queries_total",
            "query" => self.query_name,
            "outcome" => outcome
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        let ok: Result<(), sqlx::Error> = Ok(());
        assert_eq!(outcome_label(&ok), "ok");

        let missing: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        assert_eq!(outcome_label(&missing), "error");

        let timeout: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        assert_eq!(outcome_label(&timeout), "pool_timeout");
    }

    #[test]
    fn test_finish_without_recorder_is_noop() {
        let timer = QueryTimer::new("increment_invite_qr_usage");
        assert_eq!(timer.query_name, "increment_invite_qr_usage");
        timer.finish(&Ok::<_, sqlx::Error>(Some(1)));
    }
}
