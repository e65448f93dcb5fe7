//! Repository for the `kiosk_metrics` table (append-only time-series).

use kioskwatch_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::metric::{CreateKioskMetric, KioskMetric};

/// Column list for `kiosk_metrics` SELECT queries.
const COLUMNS: &str = "\
    id, kiosk_id, cpu_usage, memory_usage, disk_usage, \
    network_latency_ms, active_users, temperature_celsius, uptime_seconds, \
    recorded_at";

/// Column list for `kiosk_metrics` INSERT statements (excludes generated
/// `id` and `recorded_at`).
const INSERT_COLUMNS: &str = "\
    kiosk_id, cpu_usage, memory_usage, disk_usage, \
    network_latency_ms, active_users, temperature_celsius, uptime_seconds";

/// Provides query operations for kiosk metric samples.
pub struct MetricRepo;

impl MetricRepo {
    /// Append a sample for the kiosk with the given external identifier.
    ///
    /// Resolves the kiosk and inserts in one statement. Returns `None` when
    /// no kiosk with that `device_id` has ever been registered.
    pub async fn append(
        pool: &PgPool,
        device_id: &str,
        sample: &CreateKioskMetric,
    ) -> Result<Option<KioskMetric>, sqlx::Error> {
        let query = format!(
            "INSERT INTO kiosk_metrics ({INSERT_COLUMNS}) \
             SELECT id, $2::float8, $3::float8, $4::float8, \
                    $5::int4, $6::int4, $7::float8, $8::int8 \
             FROM kiosks WHERE device_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, KioskMetric>(&query)
            .bind(device_id)
            .bind(sample.cpu_usage)
            .bind(sample.memory_usage)
            .bind(sample.disk_usage)
            .bind(sample.network_latency_ms)
            .bind(sample.active_users)
            .bind(sample.temperature_celsius)
            .bind(sample.uptime_seconds)
            .fetch_optional(pool)
            .await
    }

    /// The most recent samples for a kiosk, newest first.
    pub async fn recent_for_kiosk(
        pool: &PgPool,
        kiosk_id: DbId,
        limit: i64,
    ) -> Result<Vec<KioskMetric>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kiosk_metrics \
             WHERE kiosk_id = $1 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, KioskMetric>(&query)
            .bind(kiosk_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete samples older than the given cutoff timestamp.
    ///
    /// Returns the number of rows deleted.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM kiosk_metrics WHERE recorded_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
