//! Calendar Store Errors
//!
//! Error types for calendar event persistence.

/// Errors that can occur in the calendar store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No event with this id
    #[error("Calendar event not found: {0}")]
    NotFound(i64),

    /// Statement rejected by the database, or the connection failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if this error came from the database
    pub fn is_database(&self) -> bool {
        matches!(self, StoreError::Database(_))
    }

    /// Check if this error is a missing event
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
