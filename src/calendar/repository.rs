//! Calendar Store Repository
//!
//! Pool-backed entry point to the calendar event statements.
//! Each operation is its own guarded unit of work.

use chrono::NaiveDateTime;
use sqlx::PgPool;

use super::guard::{guarded, ScopeGuard};
use super::queries;
use super::{BatchItem, BatchOutcome, CalendarEvent, EventChanges, EventView, NewEvent, StoreError};

/// Calendar event store
#[derive(Debug, Clone)]
pub struct CalendarStore {
    pool: PgPool,
}

impl CalendarStore {
    /// Create a new CalendarStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert an event, returning its id
    pub async fn insert(&self, event: &NewEvent) -> Result<i64, StoreError> {
        let mut guard = ScopeGuard::begin(&self.pool).await?;
        let outcome = queries::insert(guard.conn(), event)
            .await
            .map_err(StoreError::from);
        let id = guard.finish(outcome).await?;

        tracing::debug!(event_id = id, person = %event.person, "Calendar event inserted");
        Ok(id)
    }

    /// Read one event
    pub async fn read(&self, id: i64) -> Result<CalendarEvent, StoreError> {
        let mut guard = ScopeGuard::begin(&self.pool).await?;
        let outcome = queries::read(guard.conn(), id)
            .await
            .map_err(StoreError::from)
            .and_then(|row| row.ok_or(StoreError::NotFound(id)));
        guard.finish(outcome).await
    }

    /// Apply `changes` to an event and return the updated record
    pub async fn update(&self, id: i64, changes: &EventChanges) -> Result<CalendarEvent, StoreError> {
        let mut guard = ScopeGuard::begin(&self.pool).await?;
        let outcome = queries::update(guard.conn(), id, changes)
            .await
            .map_err(StoreError::from)
            .and_then(|row| row.ok_or(StoreError::NotFound(id)));
        guard.finish(outcome).await
    }

    /// Delete an event. Deleting a missing id is not an error.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut guard = ScopeGuard::begin(&self.pool).await?;
        let outcome = queries::delete(guard.conn(), id)
            .await
            .map_err(StoreError::from);
        let removed = guard.finish(outcome).await?;

        if !removed {
            tracing::debug!(event_id = id, "Delete matched no calendar event");
        }
        Ok(removed)
    }

    /// Feed of events starting within `[start, end]`
    pub async fn list_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<EventView>, StoreError> {
        let mut guard = ScopeGuard::begin(&self.pool).await?;
        let outcome = queries::list_range(guard.conn(), start, end)
            .await
            .map_err(StoreError::from);
        guard.finish(outcome).await
    }

    /// Insert records without an id and update records with one, all or nothing.
    ///
    /// An update addressing a missing id fails the whole batch with `NotFound`.
    pub async fn insert_or_edit_batch(&self, items: Vec<BatchItem>) -> Result<BatchOutcome, StoreError> {
        let count = items.len();

        let outcome = guarded(&self.pool, move |conn| {
            Box::pin(async move {
                let mut outcome = BatchOutcome::default();

                for item in &items {
                    match item.id {
                        Some(id) => {
                            queries::update(&mut *conn, id, &item.changes())
                                .await?
                                .ok_or(StoreError::NotFound(id))?;
                            outcome.updated.push(id);
                        }
                        None => {
                            let id = queries::insert(&mut *conn, &item.to_new_event()).await?;
                            outcome.inserted.push(id);
                        }
                    }
                }

                Ok::<_, StoreError>(outcome)
            })
        })
        .await?;

        tracing::info!(
            items = count,
            inserted = outcome.inserted.len(),
            updated = outcome.updated.len(),
            "Calendar event batch committed"
        );

        Ok(outcome)
    }
}
