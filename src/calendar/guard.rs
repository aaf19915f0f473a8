//! Transactional scope guard
//!
//! Borrows one pooled connection, opens a transaction, and decides commit or
//! rollback from the outcome of the unit of work run against it.

use std::future::Future;
use std::pin::Pin;

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::StoreError;

/// Boxed unit of work borrowing the guarded connection
pub type UnitOfWork<'c, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'c>>;

/// A transaction scoped to one unit of work.
///
/// Dropping the guard without calling [`ScopeGuard::finish`] rolls the
/// transaction back. The connection returns to the pool on every path.
pub struct ScopeGuard {
    tx: Transaction<'static, Postgres>,
}

impl ScopeGuard {
    /// Borrow a connection from the pool and open a transaction on it
    pub async fn begin(pool: &PgPool) -> Result<Self, StoreError> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }

    /// Connection to issue the unit of work's statements on
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Commit on success, roll back on any error.
    ///
    /// Database errors are logged here; every error is handed back unchanged.
    pub async fn finish<T>(self, outcome: Result<T, StoreError>) -> Result<T, StoreError> {
        match outcome {
            Ok(value) => match self.tx.commit().await {
                Ok(()) => Ok(value),
                Err(e) => {
                    tracing::error!("Database transaction not successful: {}", e);
                    Err(StoreError::Database(e))
                }
            },
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }

                if err.is_database() {
                    tracing::error!("Database transaction not successful: {}", err);
                } else {
                    tracing::debug!(error = %err, "Unit of work rolled back");
                }

                Err(err)
            }
        }
    }
}

/// Run `work` as one guarded unit of work
pub async fn guarded<T, F>(pool: &PgPool, work: F) -> Result<T, StoreError>
where
    F: for<'c> FnOnce(&'c mut PgConnection) -> UnitOfWork<'c, T>,
{
    let mut guard = ScopeGuard::begin(pool).await?;
    let outcome = work(guard.conn()).await;
    guard.finish(outcome).await
}

/// Collapse a database failure into `Ok(None)`; other errors still propagate.
///
/// For callers that only need to know whether a result was produced.
pub fn suppress_database_error<T>(outcome: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_database() => Ok(None),
        Err(err) => Err(err),
    }
}
