use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    kioskwatch_db::health_check(&pool).await.unwrap();

    let tables = ["kiosks", "kiosk_metrics", "kiosk_alerts", "system_events"];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// The open-alert uniqueness rule lives in the schema, not in application code.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_open_alert_index_exists(pool: PgPool) {
    let indexdef: (String,) = sqlx::query_as(
        "SELECT indexdef FROM pg_indexes \
         WHERE tablename = 'kiosk_alerts' AND indexname = 'uq_kiosk_alerts_open'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(indexdef.0.contains("UNIQUE"));
    assert!(indexdef.0.contains("WHERE (resolved = false)"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_check_constraint(pool: PgPool) {
    let result = sqlx::query("INSERT INTO kiosks (device_id, status) VALUES ('K1', 'SLEEPING')")
        .execute(&pool)
        .await;
    assert!(result.is_err(), "unknown status must be rejected");
}
