//! Common test utilities

#![allow(dead_code)]

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tokio::sync::OnceCell;

use calendar_store::{db, ConnectionUrl, Sequencer};

static SCHEMA: OnceCell<()> = OnceCell::const_new();

pub fn database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests")
}

/// Apply the shipped migrations once per test binary
async fn ensure_schema() {
    SCHEMA
        .get_or_init(|| async {
            let url = ConnectionUrl::parse(&database_url()).expect("Invalid DATABASE_URL");
            let mut conn = db::connect_single(&url).await.expect("Failed to connect to DB");

            let migrations = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
            Sequencer::new(migrations)
                .run(&mut conn, |_| {})
                .await
                .expect("Failed to apply migrations");

            conn.close().await.expect("Failed to close migration connection");
        })
        .await;
}

/// Setup test database - schema applied, fresh pool
pub async fn setup_test_db() -> PgPool {
    ensure_schema().await;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url())
        .await
        .expect("Failed to connect to DB")
}

/// Timestamp helper; each test uses its own year so tests sharing the table don't collide
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Remove every event starting in `year`
pub async fn clear_year(pool: &PgPool, year: i32) {
    sqlx::query("DELETE FROM calendar_events WHERE start_time >= $1 AND start_time < $2")
        .bind(at(year, 1, 1, 0))
        .bind(at(year + 1, 1, 1, 0))
        .execute(pool)
        .await
        .expect("Failed to clean up events");
}
