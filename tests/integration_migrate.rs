//! Integration tests for the migration sequencer

use std::fs;
use std::path::Path;

use sqlx::{Connection, PgConnection};
use tokio::sync::Mutex;

use calendar_store::migrate::{MigrationError, Progress, Sequencer};
use calendar_store::{db, ConnectionUrl};

mod common;

// Both tests create the ledger table; keep them from racing on it
static LEDGER_LOCK: Mutex<()> = Mutex::const_new(());

async fn connect() -> PgConnection {
    let url = ConnectionUrl::parse(&common::database_url()).expect("Invalid DATABASE_URL");
    db::connect_single(&url).await.expect("Failed to connect to DB")
}

async fn reset(conn: &mut PgConnection, probe_table: &str, filename_pattern: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", probe_table))
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (filename TEXT PRIMARY KEY, applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
    )
    .execute(&mut *conn)
    .await
    .unwrap();
    sqlx::query("DELETE FROM schema_migrations WHERE filename LIKE $1")
        .bind(filename_pattern)
        .execute(&mut *conn)
        .await
        .unwrap();
}

fn write_script(dir: &Path, name: &str, sql: &str) {
    fs::write(dir.join(name), sql).unwrap();
}

#[tokio::test]
async fn test_scripts_applied_in_version_order_once() {
    let _lock = LEDGER_LOCK.lock().await;
    let mut conn = connect().await;
    reset(&mut conn, "migration_probe", "migration_2999%").await;

    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "migration_29990101_2.sql",
        "INSERT INTO migration_probe (name) VALUES ('2');",
    );
    write_script(
        dir.path(),
        "migration_29990101_1.sql",
        "CREATE TABLE migration_probe (seq SERIAL PRIMARY KEY, name TEXT NOT NULL);\n\
         INSERT INTO migration_probe (name) VALUES ('1');",
    );
    write_script(
        dir.path(),
        "migration_29990101_1_1.sql",
        "INSERT INTO migration_probe (name) VALUES ('1_1');",
    );
    write_script(dir.path(), "notes.txt", "not a migration");

    let sequencer = Sequencer::new(dir.path());
    let mut events = Vec::new();
    let report = sequencer
        .run(&mut conn, |progress| match progress {
            Progress::Applying(s) => events.push(format!("start {}", s.filename())),
            Progress::Applied(s) => events.push(format!("done {}", s.filename())),
            Progress::Skipped(s) => events.push(format!("skip {}", s.filename())),
        })
        .await
        .unwrap();

    assert_eq!(
        report.applied,
        [
            "migration_29990101_1.sql",
            "migration_29990101_1_1.sql",
            "migration_29990101_2.sql",
        ]
    );
    assert_eq!(
        events,
        [
            "start migration_29990101_1.sql",
            "done migration_29990101_1.sql",
            "start migration_29990101_1_1.sql",
            "done migration_29990101_1_1.sql",
            "start migration_29990101_2.sql",
            "done migration_29990101_2.sql",
        ]
    );

    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM migration_probe ORDER BY seq")
        .fetch_all(&mut conn)
        .await
        .unwrap();
    assert_eq!(names, ["1", "1_1", "2"]);

    // Second run: everything is in the ledger, nothing executes again
    let report = sequencer.run(&mut conn, |_| {}).await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped.len(), 3);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migration_probe")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(count, 3);

    sqlx::query("DROP TABLE migration_probe").execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_first_failure_stops_the_run() {
    let _lock = LEDGER_LOCK.lock().await;
    let mut conn = connect().await;
    reset(&mut conn, "migration_probe_failing", "migration_2998%").await;

    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "migration_29980101_01.sql",
        "CREATE TABLE migration_probe_failing (name TEXT NOT NULL);",
    );
    write_script(dir.path(), "migration_29980101_02.sql", "THIS IS NOT SQL;");
    write_script(
        dir.path(),
        "migration_29980101_03.sql",
        "INSERT INTO migration_probe_failing (name) VALUES ('03');",
    );

    let mut attempted = Vec::new();
    let err = Sequencer::new(dir.path())
        .run(&mut conn, |progress| {
            if let Progress::Applying(s) = progress {
                attempted.push(s.filename().to_string());
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Apply { .. }));
    assert_eq!(err.failing_filename(), Some("migration_29980101_02.sql"));
    assert_eq!(attempted, ["migration_29980101_01.sql", "migration_29980101_02.sql"]);

    let recorded: Vec<String> = sqlx::query_scalar(
        "SELECT filename FROM schema_migrations WHERE filename LIKE 'migration_2998%' ORDER BY filename",
    )
    .fetch_all(&mut conn)
    .await
    .unwrap();
    assert_eq!(recorded, ["migration_29980101_01.sql"]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migration_probe_failing")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(count, 0);

    sqlx::query("DROP TABLE migration_probe_failing")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
}
