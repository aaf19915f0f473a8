//! Migration Sequencer
//!
//! Discover -> Sort -> Apply(0) -> ... -> Apply(n) -> Done.
//! The first failing script stops the run; later scripts are never attempted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sqlx::{Connection, Executor, PgConnection};

use super::{MigrationError, MigrationScript, MIGRATION_PREFIX};

/// Progress notifications emitted while applying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    /// About to execute this script
    Applying(&'a MigrationScript),
    /// Script executed and recorded
    Applied(&'a MigrationScript),
    /// Already recorded in the ledger, not executed again
    Skipped(&'a MigrationScript),
}

/// Summary of a finished run, file names in application order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// List migration scripts in `dir`, in directory order.
///
/// Every entry whose file name starts with `migration` is included; such a
/// name without `.sql`, or one that is not valid UTF-8, fails the whole
/// discovery.
pub async fn discover(dir: &Path) -> Result<Vec<MigrationScript>, MigrationError> {
    let discover_error = |source| MigrationError::Discover {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(discover_error)?;
    let mut scripts = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discover_error)? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(MIGRATION_PREFIX) {
            continue;
        }

        let filename = name
            .into_string()
            .map_err(|name| MigrationError::InvalidFilename(name.to_string_lossy().into_owned()))?;
        scripts.push(MigrationScript::parse(filename)?);
    }

    Ok(scripts)
}

/// Discover and sort: the order scripts will be applied in
pub async fn plan(dir: &Path) -> Result<Vec<MigrationScript>, MigrationError> {
    let mut scripts = discover(dir).await?;
    scripts.sort();
    Ok(scripts)
}

/// Applies the scripts of one directory against a database
#[derive(Debug, Clone)]
pub struct Sequencer {
    dir: PathBuf,
}

impl Sequencer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Apply every script not yet in the ledger, in version order
    pub async fn run<F>(
        &self,
        conn: &mut PgConnection,
        mut on_progress: F,
    ) -> Result<MigrationReport, MigrationError>
    where
        F: FnMut(Progress<'_>),
    {
        let scripts = plan(&self.dir).await?;

        ensure_ledger(conn).await?;
        let already_applied = applied_filenames(conn).await?;

        tracing::info!(
            dir = %self.dir.display(),
            discovered = scripts.len(),
            already_applied = already_applied.len(),
            "Starting migration run"
        );

        let mut report = MigrationReport::default();

        for script in &scripts {
            if already_applied.contains(script.filename()) {
                tracing::debug!(filename = script.filename(), "Migration already applied");
                on_progress(Progress::Skipped(script));
                report.skipped.push(script.filename().to_string());
                continue;
            }

            on_progress(Progress::Applying(script));

            let path = self.dir.join(script.filename());
            let sql = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| MigrationError::Read {
                    filename: script.filename().to_string(),
                    source,
                })?;

            if let Err(source) = apply_script(conn, script, &sql).await {
                tracing::error!(
                    filename = script.filename(),
                    error = %source,
                    "Migration failed, stopping run"
                );
                return Err(MigrationError::Apply {
                    filename: script.filename().to_string(),
                    source,
                });
            }

            tracing::info!(filename = script.filename(), "Migration applied");
            on_progress(Progress::Applied(script));
            report.applied.push(script.filename().to_string());
        }

        Ok(report)
    }
}

/// Ledger of applied scripts, keyed by file name
async fn ensure_ledger(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            filename TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn applied_filenames(conn: &mut PgConnection) -> Result<HashSet<String>, sqlx::Error> {
    let filenames: Vec<String> = sqlx::query_scalar("SELECT filename FROM schema_migrations")
        .fetch_all(&mut *conn)
        .await?;

    Ok(filenames.into_iter().collect())
}

/// Run the whole script and its ledger entry in one transaction
async fn apply_script(
    conn: &mut PgConnection,
    script: &MigrationScript,
    sql: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = conn.begin().await?;

    // Plain &str goes over the simple query protocol, so multi-statement scripts work
    (&mut *tx).execute(sql).await?;

    sqlx::query("INSERT INTO schema_migrations (filename) VALUES ($1)")
        .bind(script.filename())
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
